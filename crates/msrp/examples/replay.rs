//! Replays a captured session exchange through the dispatcher, logging every
//! message the way a live capture consumer would.

use micro_msrp::dispatch::FlowDispatcher;
use micro_msrp::sink::LogSink;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

const EXCHANGE: &[u8] = b"MSRP 95529209 SEND\r\n\
    To-Path: msrp://1.1.0.10:51272/95521545,tcp\r\n\
    From-Path: msrp://1.1.0.11:1418/55154884,tcp\r\n\
    Message-ID: 55183157\r\n\
    Byte-Range: 1-2048/822436\r\n\
    Failure-Report: yes\r\n\
    Success-Report: yes\r\n\
    Content-Type: application/octet-stream\r\n\
    \r\n\
    MSRP 95529209 200 OK\r\n\
    To-Path: msrp://1.1.0.11:1418/55154884,tcp\r\n\
    From-Path: msrp://1.1.0.10:51272/95521545,tcp\r\n\
    \r\n";

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let dispatcher = FlowDispatcher::new(|| LogSink);
    let task = dispatcher.dispatch(EXCHANGE);
    task.await.expect("connection task panicked");
}
