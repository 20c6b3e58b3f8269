#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use mysql_wire::protocol::decode::split_frame;

fuzz_target!(|data: &[u8]| {
    let mut buf = BytesMut::from(data);

    // Several packets may arrive in one read
    loop {
        let before = buf.len();
        match split_frame(&mut buf) {
            Some((header, payload)) => {
                assert_eq!(payload.len(), header.payload_len);
                assert_eq!(buf.len(), before - 4 - header.payload_len);
            }
            None => {
                assert_eq!(buf.len(), before);
                break;
            }
        }
    }
});
