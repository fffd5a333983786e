//! Dumps the raw report descriptor bytes for every enumerated device.

use hidraw_rs::{HidApi, HidDeviceBackendBase};

fn main() {
    tracing_subscriber::fmt::init();

    println!("Printing all available hid devices:");

    match HidApi::new() {
        Ok(api) => {
            for device in api.device_list() {
                println!(
                    "  {} (Interface {}):",
                    device.product_string().unwrap_or("<COULD NOT FETCH>"),
                    device.interface_number()
                );
                let mut descriptor = vec![0u8; 4096];
                match device
                    .open_device(&api)
                    .and_then(|dev| dev.get_report_descriptor(&mut descriptor).map(|n| (dev, n)))
                {
                    Ok((_dev, length)) => println!("    {:?}", &descriptor[..length]),
                    Err(err) => println!("    Failed to retrieve descriptor ({err:?})"),
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
        }
    }
}
