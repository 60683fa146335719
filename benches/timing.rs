use std::hint::black_box;
use std::time::Instant;

use courier_envelope::{Envelope, KdfParams};

fn time_it<F: FnMut()>(label: &str, iters: usize, mut f: F) {
    // warmup
    for _ in 0..(iters / 10).max(3) {
        f();
    }

    let start = Instant::now();
    for _ in 0..iters {
        f();
    }
    let elapsed = start.elapsed();

    let per_iter = elapsed / (iters as u32);
    println!("{:<16} total={:?}  per_iter={:?}", label, elapsed, per_iter);
}

fn main() {
    let env = Envelope::with_kdf(KdfParams::default());

    let plaintext = vec![0x42u8; 1024];
    let ct = env.encrypt(&plaintext, "right-key").unwrap();

    // Flip a body character; the armor checksum catches it
    let mut ct_tampered = ct.clone().into_bytes();
    let pos = ct_tampered.iter().rposition(|&b| b == b'=').unwrap() - 3;
    ct_tampered[pos] = if ct_tampered[pos] == b'A' { b'B' } else { b'A' };

    // Argon2 dominates; keep iteration counts small
    let iters = 20;

    time_it("valid", iters, || {
        let pt = env.decrypt(black_box(ct.as_bytes()), black_box("right-key")).unwrap();
        black_box(pt);
    });

    time_it("wrong_key", iters, || {
        let r = env.decrypt(black_box(ct.as_bytes()), black_box("wrong-key"));
        black_box(r.err());
    });

    time_it("bad_checksum", iters, || {
        let r = env.decrypt(black_box(&ct_tampered[..]), black_box("right-key"));
        black_box(r.err());
    });

    time_it("malformed", iters, || {
        let r = env.decrypt(black_box(&b"short"[..]), black_box("right-key"));
        black_box(r.err());
    });

    println!("\nDone.");
}
