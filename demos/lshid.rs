//! Prints out a list of HID devices.

use hidraw_rs::HidApi;

fn main() {
    tracing_subscriber::fmt::init();

    println!("Printing all available hid devices:");

    match HidApi::new() {
        Ok(api) => {
            for device in api.devices() {
                println!("{:#?}", device);
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
        }
    }
}
