//! Name fuzz target: feed arbitrary text as a composite type name.
//! Validation must not panic; it should return Ok or an InvalidName error.
//! Build with: cargo fuzz run name_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    let _ = dsdlcore::name::check_name(s);
    let declaration = dsdlcore::Declaration::new(s, dsdlcore::Version::new(1, 0));
    if let Err(e) = dsdlcore::CompositeType::structure(declaration) {
        assert!(matches!(e.kind(), dsdlcore::ErrorKind::InvalidName(_)), "{}", e);
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run name_fuzz");
}
