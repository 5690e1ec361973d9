//! Wireframe Converter Binary

use wirec::{ConverterError, EnhancedCli};
use std::process;

fn main() {
    let mut cli = EnhancedCli::new();

    match cli.run() {
        Ok(()) => {}
        Err(ConverterError::Io(e)) => {
            eprintln!("❌ IO Error: {}", e);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("❌ Conversion failed: {}", e);
            process::exit(1);
        }
    }
}
