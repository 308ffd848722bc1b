#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|randomness: u64| {
    xreduce::fuzz::fuzz_level_push_pop(randomness);
});
