use bytes::BytesMut;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use gs4_query::{QueryHandler, Request, ServerInfo, TokenAuthority};
use std::net::SocketAddr;

fn handler(players: usize) -> QueryHandler {
    let mut info = ServerInfo::new();
    info.insert("hostname".into(), "Bench Server".into());
    info.insert("gametype".into(), "SMP".into());
    info.insert("map".into(), "world".into());
    info.insert("numplayers".into(), players.to_string());
    info.insert("maxplayers".into(), "100".into());
    QueryHandler::with_token_authority(
        TokenAuthority::from_secret([1; 16]),
        info,
        (0..players).map(|i| format!("player{i}")).collect(),
    )
}

#[allow(clippy::unwrap_used)]
fn bench_handle_packet(c: &mut Criterion) {
    let mut group = c.benchmark_group("handle_packet");
    let sender: SocketAddr = "127.0.0.1:40000".parse().unwrap();

    group.bench_function("handshake", |b| {
        let handler = handler(0);
        b.iter_batched(
            || BytesMut::from(&[0x09u8, 0, 0, 0, 1][..]),
            |mut buf| handler.handle_packet(&mut buf, sender).unwrap(),
            BatchSize::SmallInput,
        )
    });

    for &players in &[0usize, 16, 100] {
        let handler = handler(players);
        let mut request = BytesMut::new();
        Request::Information {
            sequence_number: 1,
            token: handler.token_for(&sender),
        }
        .write_to(&mut request);

        let mut probe = request.clone();
        handler.handle_packet(&mut probe, sender).unwrap();
        group.throughput(Throughput::Bytes(probe.len() as u64));

        group.bench_function(format!("information_{players}_players"), |b| {
            b.iter_batched(
                || request.clone(),
                |mut buf| handler.handle_packet(&mut buf, sender).unwrap(),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_handle_packet);
criterion_main!(benches);
