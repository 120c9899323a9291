#[cfg(feature = "std")]
mod tests {
    use soil_sensor::drivers::sensors::soil::calibration::{CalibrationRecord, REVISION_NO_EEPROM};
    use soil_sensor::drivers::sensors::soil::eeprom::EepromFault;
    use soil_sensor::drivers::sensors::soil::register::{tmp112, zssc3123};
    use soil_sensor::drivers::sensors::soil::register::zssc3123::Status;
    use soil_sensor::testutil::*;
    use soil_sensor::traits::bridge::PowerMode;
    use soil_sensor::traits::onewire::{Family, Identifier};
    use soil_sensor::*;

    const PROBE: Identifier = Identifier::new([0x19, 0x5e, 0x21, 0x37, 0x00, 0x00, 0x00, 0x8c]);

    const CURVE: [u16; 11] = [
        1700, 1830, 1960, 2090, 2220, 2350, 2480, 2610, 2740, 2870, 3000,
    ];

    fn calibrated_probe() -> (SoilSensor, SimulatedBus, SimulatedBridge) {
        let mut sensor = SoilSensor::new();
        let mut bus = SimulatedBus::with_device(PROBE);
        let mut bridge = SimulatedBridge::with_image(&image(7, 0x0104, "garden", &CURVE));
        assert_eq!(Ok(PROBE), sensor.begin(&mut bus, &mut bridge));
        bridge.transactions.clear();
        (sensor, bus, bridge)
    }

    #[test]
    fn test_begin_loads_factory_calibration() {
        let mut sensor = SoilSensor::new();
        let mut bus = SimulatedBus::with_device(PROBE);
        let mut bridge = SimulatedBridge::with_image(&image(7, 0x0104, "garden", &CURVE));

        assert_eq!(Ok(PROBE), sensor.begin(&mut bus, &mut bridge));

        assert_eq!(2, bus.resets);
        assert_eq!(1, bus.searches);
        assert_eq!(vec![Family::Ds28e17], bus.targeted);
        assert_eq!(Some(PROBE), bridge.address);
        assert_eq!(Transaction::SetAddress(PROBE), bridge.transactions[0]);

        assert!(sensor.is_initialized());
        assert!(sensor.is_factory_calibrated());
        assert!(sensor.calibration_faults().is_empty());
        assert_eq!(Some(PROBE), sensor.address());

        let calibration = sensor.calibration().unwrap();
        assert_eq!(7, calibration.product());
        assert_eq!("garden", calibration.label());
        assert_eq!(&CURVE, calibration.points());

        // temperature sensor left in shutdown
        assert_eq!([0x01, 0x80], bridge.tmp112_config);
        assert_eq!(
            Some(&Transaction::MemoryWrite {
                device: tmp112::ADDR,
                register: 0x01,
                data: vec![0x01, 0x80],
            }),
            bridge.transactions.last()
        );
    }

    #[test]
    fn test_begin_retries_search() {
        let mut sensor = SoilSensor::new();
        let mut bus = SimulatedBus::with_device_after(PROBE, 10);
        let mut bridge = SimulatedBridge::with_image(&image(7, 0x0104, "garden", &CURVE));

        assert_eq!(Ok(PROBE), sensor.begin(&mut bus, &mut bridge));
        assert_eq!(11, bus.searches);
        assert_eq!(11, bus.search_resets);
    }

    #[test]
    fn test_begin_found_on_last_attempt() {
        let mut sensor = SoilSensor::new();
        let mut bus = SimulatedBus::with_device_after(PROBE, 49);
        let mut bridge = SimulatedBridge::new();
        assert_eq!(Ok(PROBE), sensor.begin(&mut bus, &mut bridge));
        assert_eq!(50, bus.searches);

        let mut sensor = SoilSensor::new();
        let mut bus = SimulatedBus::with_device_after(PROBE, 50);
        let mut bridge = SimulatedBridge::new();
        assert_eq!(
            Err(SoilSensorError::NotFound),
            sensor.begin(&mut bus, &mut bridge)
        );
        assert_eq!(50, bus.searches);
    }

    #[test]
    fn test_begin_not_found() {
        let mut sensor = SoilSensor::new();
        let mut bus = SimulatedBus::empty();
        let mut bridge = SimulatedBridge::new();

        assert_eq!(
            Err(SoilSensorError::NotFound),
            sensor.begin(&mut bus, &mut bridge)
        );
        assert_eq!(50, bus.searches);

        // no binding, no traffic
        assert_eq!(None, bridge.address);
        assert!(bridge.transactions.is_empty());

        assert!(!sensor.is_initialized());
        assert_eq!(None, sensor.address());
        assert_eq!(None, sensor.calibration());
        assert_eq!(
            Err(SoilSensorError::NotInitialized),
            sensor.read_moisture(&mut bridge)
        );
        let mut delay = RecordingDelay::new();
        assert_eq!(
            Err(SoilSensorError::NotInitialized),
            sensor.read_temperature_celsius(&mut bridge, &mut delay)
        );
        assert_eq!(0, delay.calls);
    }

    #[test]
    fn test_begin_skips_other_families() {
        let ds18b20 = Identifier::new([0x28, 0xff, 0x4c, 0x1a, 0x61, 0x16, 0x04, 0x3d]);
        let mut sensor = SoilSensor::new();
        let mut bus = SimulatedBus::with_device(ds18b20);
        let mut bridge = SimulatedBridge::new();

        assert_eq!(
            Err(SoilSensorError::NotFound),
            sensor.begin(&mut bus, &mut bridge)
        );
        assert_eq!(None, bridge.address);
    }

    #[test]
    fn test_search_timeout_is_configurable() {
        let mut sensor = SoilSensor::with_config(Config {
            search_timeout: 5,
            ..Default::default()
        });
        let mut bus = SimulatedBus::empty();
        let mut bridge = SimulatedBridge::new();

        assert_eq!(
            Err(SoilSensorError::NotFound),
            sensor.begin(&mut bus, &mut bridge)
        );
        assert_eq!(5, bus.searches);
    }

    #[test]
    fn test_begin_fails_when_shutdown_fails() {
        let mut sensor = SoilSensor::new();
        let mut bus = SimulatedBus::with_device(PROBE);
        let mut bridge = SimulatedBridge::with_image(&image(7, 0x0104, "garden", &CURVE));
        bridge.fail_register(tmp112::ADDR, 0x01);

        assert_eq!(
            Err(SoilSensorError::Bridge(SimulatedError::Nack)),
            sensor.begin(&mut bus, &mut bridge)
        );
        assert!(!sensor.is_initialized());
    }

    #[test]
    fn test_begin_with_erased_eeprom() {
        let mut sensor = SoilSensor::new();
        let mut bus = SimulatedBus::with_device(PROBE);
        let mut bridge = SimulatedBridge::new();

        assert_eq!(Ok(PROBE), sensor.begin(&mut bus, &mut bridge));
        assert!(sensor.is_initialized());
        assert!(!sensor.is_factory_calibrated());

        let faults = sensor.calibration_faults();
        assert_eq!(
            &[
                EepromFault::BadSignature(0xFFFF_FFFF),
                EepromFault::BadVersion(0xFF),
                EepromFault::BadLength(0xFF),
            ],
            &faults[..3]
        );
        assert!(faults.contains(&EepromFault::NonMonotonic));

        let calibration = sensor.calibration().unwrap();
        assert_eq!(&CalibrationRecord::uncalibrated(), calibration);
        assert_eq!(REVISION_NO_EEPROM, calibration.revision());

        // third point of the evenly spaced curve
        bridge.set_capacitance(0, 1936);
        assert_eq!(Ok(20), sensor.read_moisture(&mut bridge));
    }

    #[test]
    fn test_read_moisture() {
        let (mut sensor, _, mut bridge) = calibrated_probe();
        bridge.set_capacitance(0, 1960);

        assert_eq!(Ok(1960), sensor.read_moisture_raw(&mut bridge));
        assert_eq!(
            vec![
                Transaction::Write {
                    device: zssc3123::ADDR,
                    data: vec![0x00],
                },
                Transaction::Read {
                    device: zssc3123::ADDR,
                    len: 2,
                },
            ],
            bridge.transactions
        );

        assert_eq!(Ok(20), sensor.read_moisture(&mut bridge));

        bridge.set_capacitance(0, 1000);
        assert_eq!(Ok(0), sensor.read_moisture(&mut bridge));

        bridge.set_capacitance(0, 3500);
        assert_eq!(Ok(100), sensor.read_moisture(&mut bridge));
    }

    #[test]
    fn test_read_moisture_interval() {
        let (mut sensor, _, mut bridge) = calibrated_probe();
        bridge.set_capacitance(0, 1960);

        assert_eq!(Ok(200), sensor.read_moisture_interval(&mut bridge, 0, 1000));
        // interpolated values are not shifted by the lower bound
        assert_eq!(Ok(20), sensor.read_moisture_interval(&mut bridge, 10, 110));
        bridge.set_capacitance(0, 1000);
        assert_eq!(Ok(10), sensor.read_moisture_interval(&mut bridge, 10, 110));
        bridge.set_capacitance(0, 3000);
        assert_eq!(Ok(110), sensor.read_moisture_interval(&mut bridge, 10, 110));
        assert_eq!(
            Err(SoilSensorError::Calibration(
                soil_sensor::drivers::sensors::soil::calibration::CalibrationError::InvalidRange {
                    min: 100,
                    max: 0
                }
            )),
            sensor.read_moisture_interval(&mut bridge, 100, 0)
        );
    }

    #[test]
    fn test_moisture_not_ready() {
        let (mut sensor, _, mut bridge) = calibrated_probe();

        bridge.set_capacitance(0b01, 2000);
        assert_eq!(
            Err(SoilSensorError::NotReady(Status::Stale)),
            sensor.read_moisture_raw(&mut bridge)
        );

        bridge.set_capacitance(0b11, 2000);
        assert_eq!(
            Err(SoilSensorError::NotReady(Status::Diagnostic)),
            sensor.read_moisture(&mut bridge)
        );

        // a retry after the converter settles succeeds
        bridge.set_capacitance(0b00, 2000);
        assert_eq!(Ok(2000), sensor.read_moisture_raw(&mut bridge));
    }

    #[test]
    fn test_moisture_transport_failure() {
        let (mut sensor, _, mut bridge) = calibrated_probe();
        bridge.fail(zssc3123::ADDR);

        assert_eq!(
            Err(SoilSensorError::Bridge(SimulatedError::Nack)),
            sensor.read_moisture(&mut bridge)
        );
        // the trigger failed, no read was attempted
        assert_eq!(1, bridge.transactions.len());
    }

    #[test]
    fn test_read_temperature() {
        let (mut sensor, _, mut bridge) = calibrated_probe();
        let mut delay = RecordingDelay::new();
        bridge.set_temperature_raw(400);

        let celsius = sensor
            .read_temperature_celsius(&mut bridge, &mut delay)
            .unwrap();
        assert_eq!(25.0, celsius.raw_value());
        assert_eq!(1, delay.total_ms());
        assert_eq!(
            vec![
                Transaction::MemoryWrite {
                    device: tmp112::ADDR,
                    register: 0x01,
                    data: vec![0x81, 0x80],
                },
                Transaction::MemoryRead {
                    device: tmp112::ADDR,
                    register: 0x00,
                    len: 2,
                },
            ],
            bridge.transactions
        );
    }

    #[test]
    fn test_temperature_units() {
        let (mut sensor, _, mut bridge) = calibrated_probe();
        let mut delay = RecordingDelay::new();
        bridge.set_temperature_raw(347);

        let c = sensor
            .read_temperature_celsius(&mut bridge, &mut delay)
            .unwrap();
        let k = sensor
            .read_temperature_kelvin(&mut bridge, &mut delay)
            .unwrap();
        let f = sensor
            .read_temperature_fahrenheit(&mut bridge, &mut delay)
            .unwrap();

        assert_eq!(21.6875, c.raw_value());
        assert_eq!(c.raw_value() + 273.15, k.raw_value());
        assert_eq!(c.raw_value() * 1.8 + 32.0, f.raw_value());

        // every unit starts its own conversion
        let one_shots = bridge
            .transactions
            .iter()
            .filter(|t| matches!(t, Transaction::MemoryWrite { data, .. } if data[..] == [0x81, 0x80]))
            .count();
        assert_eq!(3, one_shots);
        assert_eq!(3, delay.calls);
    }

    #[test]
    fn test_negative_temperature() {
        let (mut sensor, _, mut bridge) = calibrated_probe();
        let mut delay = RecordingDelay::new();
        bridge.set_temperature_raw(-160);

        let celsius = sensor
            .read_temperature_celsius(&mut bridge, &mut delay)
            .unwrap();
        assert_eq!(-10.0, celsius.raw_value());
    }

    #[test]
    fn test_conversion_delay_is_configurable() {
        let mut sensor = SoilSensor::with_config(Config {
            conversion_delay_ms: 30,
            ..Default::default()
        });
        let mut bus = SimulatedBus::with_device(PROBE);
        let mut bridge = SimulatedBridge::new();
        sensor.begin(&mut bus, &mut bridge).unwrap();

        let mut delay = RecordingDelay::new();
        sensor
            .read_temperature_celsius(&mut bridge, &mut delay)
            .unwrap();
        assert_eq!(30, delay.total_ms());
    }

    #[test]
    fn test_temperature_transport_failure() {
        let (mut sensor, _, mut bridge) = calibrated_probe();
        let mut delay = RecordingDelay::new();
        bridge.fail_register(tmp112::ADDR, 0x00);

        assert_eq!(
            Err(SoilSensorError::Bridge(SimulatedError::Nack)),
            sensor.read_temperature_fahrenheit(&mut bridge, &mut delay)
        );
    }

    #[test]
    fn test_wake_up_and_sleep() {
        let (mut sensor, _, mut bridge) = calibrated_probe();
        assert_eq!(PowerMode::Active, sensor.power_mode());

        sensor.sleep(&mut bridge).unwrap();
        assert_eq!(PowerMode::Sleep, sensor.power_mode());
        assert_eq!(PowerMode::Sleep, bridge.power);

        sensor.wake_up(&mut bridge).unwrap();
        sensor.wake_up(&mut bridge).unwrap();
        assert_eq!(PowerMode::Active, sensor.power_mode());
        assert_eq!(
            vec![
                Transaction::Power(PowerMode::Sleep),
                Transaction::Power(PowerMode::Active),
                Transaction::Power(PowerMode::Active),
            ],
            bridge.transactions
        );
    }

    #[test]
    fn test_read_acquisition() {
        let (mut sensor, _, mut bridge) = calibrated_probe();
        let mut delay = RecordingDelay::new();
        bridge.set_temperature_raw(288);
        bridge.set_capacitance(0, 2025);

        let acquisition = sensor.read(&mut bridge, &mut delay).unwrap();
        assert_eq!(18.0, acquisition.temperature.raw_value());
        assert_eq!(25, acquisition.moisture);
    }

    #[test]
    fn test_probes_are_independent() {
        let other = Identifier::new([0x19, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77]);
        let (first, _, _) = calibrated_probe();

        let mut second = SoilSensor::new();
        let mut bus = SimulatedBus::with_device(other);
        let mut bridge = SimulatedBridge::new();
        second.begin(&mut bus, &mut bridge).unwrap();

        assert_eq!(Some(PROBE), first.address());
        assert_eq!(Some(other), second.address());
        assert!(first.is_factory_calibrated());
        assert!(!second.is_factory_calibrated());
    }

    #[test]
    fn test_failed_rediscovery_resets_session() {
        let (mut sensor, _, mut bridge) = calibrated_probe();
        let mut bus = SimulatedBus::empty();

        assert_eq!(
            Err(SoilSensorError::NotFound),
            sensor.begin(&mut bus, &mut bridge)
        );
        assert!(!sensor.is_initialized());
        assert!(sensor.calibration_faults().is_empty());
    }
}
