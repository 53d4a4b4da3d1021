// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Misc utility functions.

use std::{fs::OpenOptions, io::Write, time::Duration};

use crate::sampling::{MANTISSA_BITS, MANTISSA_MASK};

/// Split a double into its biased exponent and mantissa fields.
/// The sign bit is ignored, all values here are non-negative.
pub fn split_fields(value: f64) -> (u64, u64) {
    let bits = value.to_bits();
    ((bits >> MANTISSA_BITS) & 0x7ff, bits & MANTISSA_MASK)
}

/// Append a line to the result file and echo it to stdout.
/// Failing to write the report is not worth aborting a run over,
/// the error is printed and the run continues.
pub fn write_and_print(line: String, file_path: &str) {
    println!("{}", line);
    match OpenOptions::new().create(true).append(true).open(file_path) {
        Ok(mut f) => {
            if let Err(e) = writeln!(f, "{}", line) {
                eprintln!("result file write failed: {}", e);
            }
        }
        Err(e) => eprintln!("result file open failed: {}", e),
    }
}

/// Format a duration compactly for result lines.
pub fn format_elapsed_time(elapsed: Duration) -> String {
    if elapsed.as_secs() > 0 {
        format!("{:>8.3}s", elapsed.as_secs_f64())
    } else {
        format!("{:>7.3}ms", elapsed.as_secs_f64() * 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_fields_matches_layout() {
        assert_eq!(split_fields(1.0), (1023, 0));
        assert_eq!(split_fields(0.5), (1022, 0));
        let (exp, mantissa) = split_fields(1.5);
        assert_eq!(exp, 1023);
        assert_eq!(mantissa, 1 << (MANTISSA_BITS - 1));
        assert_eq!(split_fields(0.0), (0, 0));
    }
}
