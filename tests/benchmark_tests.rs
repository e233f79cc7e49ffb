//! Performance benchmarks for the hot paths of a game turn

use bytes::BytesMut;
use client::cache::ClientCache;
use shared::{Board, Frame, FrameCodec, GameOutcome, Move, Symbol};
use std::time::Instant;
use tokio_util::codec::{Decoder, Encoder};

/// Benchmarks win/draw evaluation on a mid-game board
#[test]
fn benchmark_outcome_evaluation() {
    let mut board = Board::new();
    for mv in [
        Move::new(0, 0, Symbol::X),
        Move::new(1, 1, Symbol::O),
        Move::new(2, 2, Symbol::X),
        Move::new(0, 2, Symbol::O),
    ] {
        board.apply_move(mv).unwrap();
        board.advance_turn();
    }

    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        assert_eq!(board.evaluate_outcome(), GameOutcome::InProgress);
    }

    let duration = start.elapsed();
    println!(
        "Outcome evaluation: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 200ms for 100k iterations, even unoptimized
    assert!(duration.as_millis() < 200);
}

/// Benchmarks playing complete games through the board rules
#[test]
fn benchmark_full_games() {
    let top_row_win = [(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)];

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let mut board = Board::new();
        let mut outcome = GameOutcome::InProgress;
        for (row, col) in top_row_win {
            let mv = Move::new(row, col, board.current_turn());
            board.apply_move(mv).unwrap();
            outcome = board.evaluate_outcome();
            board.advance_turn();
        }
        assert_eq!(outcome, GameOutcome::Win(Symbol::X));
    }

    let duration = start.elapsed();
    println!(
        "Full games: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 200);
}

/// Benchmarks parsing the frames a client receives every turn
#[test]
fn benchmark_frame_parsing() {
    let lines = ["MOVE:1,1,X", "STATE:X O  X  O", "CHAT:good game", "WINNER:O"];

    let iterations = 25_000;
    let start = Instant::now();

    for _ in 0..iterations {
        for line in &lines {
            let _ = line.parse::<Frame>().unwrap();
        }
    }

    let duration = start.elapsed();
    println!(
        "Frame parsing: {} frames in {:?} ({:.2} ns/frame)",
        iterations * lines.len(),
        duration,
        duration.as_nanos() as f64 / (iterations * lines.len()) as f64
    );

    assert!(duration.as_millis() < 500);
}

/// Benchmarks the line codec in both directions
#[test]
fn benchmark_codec_throughput() {
    let mut codec = FrameCodec::new();
    let frame = Frame::Move(Move::new(2, 1, Symbol::O));

    let iterations = 50_000;
    let mut buffer = BytesMut::with_capacity(iterations * 12);
    let start = Instant::now();

    for _ in 0..iterations {
        codec.encode(frame.clone(), &mut buffer).unwrap();
    }

    let mut decoded = 0;
    while let Some(line) = codec.decode(&mut buffer).unwrap() {
        assert_eq!(line, "MOVE:2,1,O");
        decoded += 1;
    }

    let duration = start.elapsed();
    println!(
        "Codec: {} frames encoded and decoded in {:?}",
        decoded, duration
    );

    assert_eq!(decoded, iterations);
    assert!(duration.as_millis() < 500);
}

/// Stress test applying a long stream of frames to the client cache
#[test]
fn stress_test_cache_updates() {
    let cache = ClientCache::new();
    cache.apply(&Frame::Assign(Symbol::O));

    let frames = [
        Frame::Move(Move::new(0, 0, Symbol::X)),
        "STATE:X        ".parse::<Frame>().unwrap(),
        Frame::Chat("hi".to_string()),
        Frame::State(Board::new()),
    ];

    let iterations = 20_000;
    let start = Instant::now();

    for _ in 0..iterations {
        for frame in &frames {
            cache.apply(frame);
        }
    }

    let duration = start.elapsed();
    println!(
        "Cache updates: {} frames in {:?}",
        iterations * frames.len(),
        duration
    );

    let snapshot = cache.snapshot();
    assert!(snapshot.board.is_empty());
    assert!(!snapshot.my_turn);
    assert_eq!(snapshot.chat_log.len(), client::cache::CHAT_HISTORY);
    assert!(duration.as_millis() < 500);
}
