use measurements::Current;
use tracing_subscriber::EnvFilter;

use thorlabs_cld1015::{Cld1015, PowerOnOutcome, UsbTmcInterfaceCld1015};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let device = "/dev/usbtmc0";

    let interface = UsbTmcInterfaceCld1015::simple(device).expect("Failed to open device");
    let mut inst = Cld1015::try_new(interface).unwrap();

    println!("Instrument name: {}", inst.get_name().unwrap());
    println!("Key locked: {}", inst.get_key_locked().unwrap());
    println!("TEC on: {}", inst.get_tec_state().unwrap());
    println!("LD on: {}", inst.get_ld_state().unwrap());

    inst.set_ld_current(Current::from_milliamperes(100.0)).unwrap();
    println!("LD current setpoint: {:?}", inst.get_ld_current_setpoint().unwrap());

    match inst.on().unwrap() {
        PowerOnOutcome::LaserOn => {
            println!("LD current: {:?}", inst.get_ld_current().unwrap());
            inst.off().unwrap();
        }
        outcome => println!("Could not switch on laser: {outcome}"),
    }

    for err in inst.read_error_queue().unwrap() {
        println!("Instrument error: {err}");
    }
}
