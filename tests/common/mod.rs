//! Shared fixtures: a fake prior case on disk.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use clalpha::stager::required_files;

pub const MAIN_INPUT_A: &str = "\
istart 0
ntstep 1000

#vals 6 title primitive_variables_2
values 101325 288 50 0 0
aero_u 50
aero_v 0
aero_w 0

aero_alpha 0.0
cldriver 0
";

pub const REFERENCE_A: &str = "\
area 1.0

alpha 0.0
length 0.5
";

/// Write every allow-listed file for `nprocs` into `root/name`.
/// Binary files get a few non-UTF-8 bytes so byte-exact copying shows.
pub fn make_source_case(root: &Path, name: &str, nprocs: usize, main_input: &str) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    for file in required_files(nprocs) {
        let path = dir.join(&file);
        match file.as_str() {
            "mcfd.inp" => fs::write(&path, main_input).unwrap(),
            "infout1f.inp" => fs::write(&path, REFERENCE_A).unwrap(),
            _ => fs::write(&path, binary_payload(&file)).unwrap(),
        }
    }
    // Output of the previous run, must not be carried over.
    fs::write(dir.join(format!("{name}.log")), "solver output\n").unwrap();
    fs::write(dir.join("cdepsout.bin.bak"), [0u8; 4]).unwrap();
}

pub fn binary_payload(name: &str) -> Vec<u8> {
    let mut bytes = vec![0xff, 0x00, 0xfe, 0x80, b'\n', b'\r'];
    bytes.extend_from_slice(name.as_bytes());
    bytes
}

/// Value of `key` in a patched input file.
pub fn value_of(text: &str, key: &str) -> Option<String> {
    text.lines()
        .find(|l| l.split_whitespace().next() == Some(key))
        .and_then(|l| l.split_whitespace().nth(1))
        .map(str::to_string)
}

/// Velocity triple of the `values` record line.
pub fn record_velocity(text: &str) -> (f64, f64, f64) {
    let line = text
        .lines()
        .find(|l| l.starts_with("values "))
        .expect("record line");
    let f: Vec<f64> = line.split_whitespace().skip(1).map(|t| t.parse().unwrap()).collect();
    (f[2], f[3], f[4])
}
