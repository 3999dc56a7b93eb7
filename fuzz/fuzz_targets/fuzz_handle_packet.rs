#![no_main]

use bytes::BytesMut;
use gs4_query::{QueryHandler, ServerInfo, TokenAuthority};
use libfuzzer_sys::fuzz_target;
use std::net::SocketAddr;
use std::sync::OnceLock;

static HANDLER: OnceLock<QueryHandler> = OnceLock::new();

fuzz_target!(|data: &[u8]| {
    let handler = HANDLER.get_or_init(|| {
        let mut info = ServerInfo::new();
        info.insert("hostname".into(), "fuzz".into());
        QueryHandler::with_token_authority(
            TokenAuthority::from_secret([0x5A; 16]),
            info,
            vec!["player".into()],
        )
    });

    let sender = SocketAddr::from(([127, 0, 0, 1], 19132));
    let mut buf = BytesMut::from(data);
    let original = buf.clone();
    if handler.handle_packet(&mut buf, sender).is_err() {
        // Rejected datagrams leave the buffer untouched
        assert_eq!(buf, original);
    }
});
