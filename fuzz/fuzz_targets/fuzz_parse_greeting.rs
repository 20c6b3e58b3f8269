#![no_main]

use libfuzzer_sys::fuzz_target;
use mysql_wire::protocol::decode::parse_greeting;

fuzz_target!(|data: &[u8]| {
    if let Ok(greeting) = parse_greeting(data) {
        assert_eq!(greeting.protocol_version, 10);
        assert!(greeting.auth_plugin_data.len() <= data.len());
    }
});
