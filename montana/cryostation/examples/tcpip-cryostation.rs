use measurements::Temperature;
use tracing_subscriber::EnvFilter;

use montana_cryostation::{Cryostation, TcpIpInterfaceCryostation};

fn main() {
    // Show the warnings of the driver, e.g., unavailable readings. Use RUST_LOG to see more.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let host = "192.168.1.100";

    // Connect to the Cryostation software on the default port.
    let interface = TcpIpInterfaceCryostation::simple(host).expect("Failed to connect");
    let mut inst = Cryostation::try_new(interface).unwrap();

    println!("Alarm state: {}", inst.get_alarm_state().unwrap());
    println!("Chamber pressure: {:?}", inst.get_chamber_pressure().unwrap());

    println!("Temperature and stability metrics");
    println!("Platform temperature: {:?}", inst.get_platform_temperature().unwrap());
    println!("Platform stability: {:?}", inst.get_platform_stability().unwrap());
    println!("Stage 1 temperature: {:?}", inst.get_stage_1_temperature().unwrap());
    println!("Stage 2 temperature: {:?}", inst.get_stage_2_temperature().unwrap());
    println!("Sample temperature: {:?}", inst.get_sample_temperature().unwrap());
    println!("Sample stability: {:?}", inst.get_sample_stability().unwrap());

    println!("Heater metrics");
    println!("Platform heater power: {:?}", inst.get_platform_heater_power().unwrap());
    println!("Stage 1 heater power: {:?}", inst.get_stage_1_heater_power().unwrap());

    println!("Testing temperature setpoint...");
    println!("System setpoint: {:?}", inst.get_temperature_setpoint().unwrap());
    let resp = inst.set_temperature_setpoint(Temperature::from_kelvin(20.0)).unwrap();
    println!("Set setpoint to 20.0 K: {resp}");
    println!("System setpoint: {:?}", inst.get_temperature_setpoint().unwrap());
    let resp = inst.set_temperature_setpoint(Temperature::from_kelvin(3.2)).unwrap();
    println!("Set setpoint to 3.2 K: {resp}");
    println!("System setpoint: {:?}", inst.get_temperature_setpoint().unwrap());

    println!("Test system actions");
    println!("Starting cool down: {}", inst.start_cool_down().unwrap());
    println!("Starting standby: {}", inst.start_standby().unwrap());
    println!("Starting warm up: {}", inst.start_warm_up().unwrap());

    inst.close().unwrap();
}
