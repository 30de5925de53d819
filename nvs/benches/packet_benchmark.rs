use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use nvs::{encode_frame, DecoderOptions, FrameSync, Receiver};

const EPOCHS: usize = 600;
const SATELLITES: u8 = 12;

fn raw_frame(tow_ms: f64) -> Vec<u8> {
    let leap_ms = 18_000.0;
    let mut payload = Vec::new();
    payload.extend((tow_ms - leap_ms).to_le_bytes());
    payload.extend(((2300 % 1024) as u16).to_le_bytes());
    payload.extend(leap_ms.to_le_bytes());
    payload.extend(0.0f64.to_le_bytes());
    payload.push(0);
    for prn in 1..=SATELLITES {
        payload.extend([2, prn, 0, 40 + prn]);
        payload.extend((1.1e8 + prn as f64 * 1e5).to_le_bytes());
        payload.extend((70.0 + prn as f64 * 0.25).to_le_bytes());
        payload.extend((-1000.0 + prn as f64 * 16.0).to_le_bytes());
        payload.extend([0x13, 0x00]);
    }
    encode_frame(0xF5, &payload)
}

fn recording() -> Vec<u8> {
    let mut data = Vec::new();
    for epoch in 0..EPOCHS {
        data.extend(raw_frame(345_600_000.0 + epoch as f64 * 1000.0));
        // time scale parameters every epoch, ionosphere now and then
        data.extend(encode_frame(0x4B, &[0x10; 23]));
        if epoch % 30 == 0 {
            data.extend(encode_frame(0x4A, &[0x10; 33]));
        }
    }
    data
}

fn sync_all(sync: &mut FrameSync, data: &[u8], chunk_size: usize) -> usize {
    let mut count = 0;
    for chunk in data.chunks(chunk_size) {
        let mut it = sync.consume(chunk);
        while let Some(frame) = it.next() {
            match frame {
                Ok(frame) => count += frame.len(),
                Err(e) => panic!("No errors allowed! got: {:?}", e),
            }
        }
    }
    count
}

fn decode_all(receiver: &mut Receiver, data: &[u8], chunk_size: usize) -> usize {
    data.chunks(chunk_size)
        .map(|chunk| receiver.consume(chunk).filter(Result::is_ok).count())
        .sum()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let data = recording();
    for chunk in &[99, 100, 101, 256, 512, 1000, 1024] {
        c.bench_function(&format!("sync_frames_{}", chunk), |b| {
            b.iter(|| {
                let mut sync = FrameSync::new();
                black_box(sync_all(&mut sync, &data, *chunk))
            })
        });
    }
    for chunk in &[256, 1024, 4096] {
        c.bench_function(&format!("decode_recording_{}", chunk), |b| {
            b.iter(|| {
                let options = DecoderOptions::default().with_reference_week(2300);
                let mut receiver = Receiver::new(options);
                black_box(decode_all(&mut receiver, &data, *chunk))
            })
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
