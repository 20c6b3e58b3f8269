#![no_main]

use libfuzzer_sys::fuzz_target;
use mysql_wire::protocol::decode::parse_error_packet;

fuzz_target!(|data: &[u8]| {
    if let Ok(err) = parse_error_packet(data) {
        assert_eq!(data[0], 0xFF);
        if let Some(state) = err.sql_state {
            assert!(state.chars().count() <= 5);
        }
    }
});
