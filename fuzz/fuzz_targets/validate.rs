#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (jsv::Draft, Vec<u8>, Vec<u8>)| {
    let (draft, schema, instance) = input;
    let options = jsv::Options::new().with_draft(draft);

    // We're only interested in fuzzing against valid schemas.
    let schema = match jsv::JsonSchema::with_options(&schema[..], options) {
        Ok(schema) => schema,
        Err(_) => return,
    };

    let _ = schema.validate_bytes(&instance, None);
});
