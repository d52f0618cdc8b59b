#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: String| {
    if let Ok(path) = input.parse::<jsv::JsonPath>() {
        assert_eq!(Ok(&path), path.to_dot().parse::<jsv::JsonPath>().as_ref());
        assert_eq!(Ok(&path), path.to_bracket().parse::<jsv::JsonPath>().as_ref());
        assert_eq!(Ok(&path), path.to_pointer().parse::<jsv::JsonPath>().as_ref());
    }
});
