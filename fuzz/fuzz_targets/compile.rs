#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|draft_and_schema: (jsv::Draft, Vec<u8>)| {
    let (draft, schema) = draft_and_schema;
    let options = jsv::Options::new().with_draft(draft);

    // Broken schemas must be reported, never panic.
    let _ = jsv::JsonSchema::with_options(&schema[..], options);
});
