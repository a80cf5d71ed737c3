//! End-to-end decoding scenarios over synthetic PTRAC traces

use ptrac_decoder::{
    BankReason, CountingSink, Decoder, DecoderConfig, DecoderError, EventKind, EventRecord,
    KindFields, ScanState, TERMINATION_MARKER,
};
use std::io::Write;
use std::path::Path;

/// Standard preamble: 4 prelude, 3 filter, 1 count and 3 id lines
const PREAMBLE: &str = "\
   -1
mcnp6     6   03/05/24 10:12:41
Sample problem: point source in a water sphere
   1.4000000E+01   0.0000000E+00
   1.0000000E+00   2.0000000E+00
   3.0000000E+00   4.0000000E+00
   5.0000000E+00   6.0000000E+00
   2   4   6   6   8   7   8   8   8   9   9   4   0
   1   2   7   8   9  17  18  19  20  21
  22  23  24  25  26  27  28   7   8  10
  11  16  17  18  19  20  21  22  23  24
";

const SCENARIO_A: &str = "\
1 1000
9000 0 1 5 5 2 0
1.0 2.0 3.0 0.1 0.2 0.97 14.1 1.0 0.0
";

const SCENARIO_B: &str = "\
2 4000
9000 1 8016 2 7 2 1
-1.5 0.25 4.0 0.6 0.0 0.8 9.75 0.5 1.2
";

fn trace(body: &[&str]) -> String {
    let mut text = PREAMBLE.to_string();
    for part in body {
        text.push_str(part);
    }
    text
}

fn decode_ok(text: &str) -> Vec<EventRecord> {
    Decoder::default()
        .decode_str(text)
        .collect::<Result<Vec<_>, _>>()
        .expect("trace should decode cleanly")
}

#[test]
fn test_scenario_a_single_source_event() {
    let text = trace(&[SCENARIO_A]);
    let mut events = Decoder::default().decode_str(&text);
    let records: Vec<_> = events.by_ref().collect::<Result<_, _>>().unwrap();

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.history_id, 1);
    assert_eq!(record.kind, EventKind::Source);
    assert_eq!(record.initial_kind, EventKind::Source);
    assert_eq!(record.next_kind_code, TERMINATION_MARKER);
    assert_eq!(
        record.fields,
        KindFields::Source {
            source_type: 1,
            cell: 5,
            material: 2
        }
    );
    assert_eq!(record.position, [1.0, 2.0, 3.0]);
    assert_eq!(record.direction, [0.1, 0.2, 0.97]);
    assert_eq!(record.energy, 14.1);
    assert_eq!(record.weight, 1.0);
    assert_eq!(record.time, 0.0);

    let stats = events.stats();
    assert_eq!(stats.total_events, 1);
    assert_eq!(stats.total_completed_histories, 1);
    assert_eq!(events.preamble().variable_ids.len(), 30);
}

#[test]
fn test_scenario_b_collision_history_follows() {
    let text = trace(&[SCENARIO_A, SCENARIO_B]);
    let mut events = Decoder::default().decode_str(&text);
    let records: Vec<_> = events.by_ref().collect::<Result<_, _>>().unwrap();

    assert_eq!(records.len(), 2);
    let collision = &records[1];
    assert_eq!(collision.history_id, 2);
    assert_eq!(collision.kind, EventKind::Collision);
    assert_eq!(collision.initial_kind, EventKind::Collision);
    assert_eq!(collision.zzaaa(), Some(8016));
    assert_eq!(collision.reaction_type(), Some(2));
    assert_eq!(collision.cell(), Some(7));

    let stats = events.stats();
    assert_eq!(stats.total_events, 2);
    assert_eq!(stats.total_completed_histories, 2);
}

#[test]
fn test_scenario_c_truncated_after_header() {
    let text = trace(&[SCENARIO_A, "3 1000\n"]);
    let mut received: Vec<EventRecord> = Vec::new();

    let err = Decoder::default()
        .decode_into(text.as_bytes(), &mut received)
        .unwrap_err();

    assert!(matches!(
        err,
        DecoderError::TruncatedStream {
            expected: ScanState::EventInfoLine,
            ..
        }
    ));
    assert_eq!(received, decode_ok(&trace(&[SCENARIO_A])));
}

#[test]
fn test_truncated_before_detail() {
    let text = trace(&[SCENARIO_A, "3 1000\n9000 0 1 5 5 2 0\n"]);
    let results: Vec<_> = Decoder::default().decode_str(&text).collect();

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1],
        Err(DecoderError::TruncatedStream {
            expected: ScanState::EventDetailLine,
            ..
        })
    ));
}

#[test]
fn test_scenario_d_short_detail_line_resyncs() {
    let short = "\
2 4000
9000 1 8016 2 7 2 1
-1.5 0.25 4.0 0.6 0.0 0.8
";
    let text = trace(&[SCENARIO_A, short, SCENARIO_B.replacen("2 4000", "3 4000", 1).as_str()]);
    let mut events = Decoder::default().decode_str(&text);
    let results: Vec<_> = events.by_ref().collect();

    assert_eq!(results.len(), 3);
    assert!(matches!(
        results[1],
        Err(DecoderError::MissingField {
            role: ScanState::EventDetailLine,
            expected: 9,
            found: 6,
            ..
        })
    ));
    let resumed = results[2].as_ref().unwrap();
    assert_eq!(resumed.history_id, 3);

    let stats = events.stats();
    assert_eq!(stats.total_events, 2);
    assert_eq!(stats.total_completed_histories, 2);
    assert_eq!(stats.discarded_events, 1);
    assert_eq!(stats.recovered_errors, 1);
}

#[test]
fn test_short_detail_mid_history_skips_to_next_header() {
    let broken = "\
2 1000
4000 0 1 5 5 2 0
0.0 0.0 0.0
9000 1 8016 2 5 2 1
1.0 1.0 1.0 0.0 0.0 1.0 1.0 1.0 1.0
";
    let text = trace(&[broken, SCENARIO_A.replacen("1 1000", "3 1000", 1).as_str()]);
    let mut events = Decoder::default().decode_str(&text);
    let ok: Vec<_> = events.by_ref().filter_map(|r| r.ok()).collect();

    assert_eq!(ok.len(), 1);
    assert_eq!(ok[0].history_id, 3);
    assert_eq!(events.stats().skipped_lines, 2);
}

#[test]
fn test_multi_event_history_with_bank() {
    let history = "\
4 1000
2006 0 1 5 5 2 0
0.0 0.0 0.0 0.0 0.0 1.0 14.0 1.0 0.0
4000 1 1001 0 5 2 0
0.0 0.0 1.0 0.0 0.0 1.0 14.0 0.5 0.1
5000 2 1001 102 5 2 1
0.0 0.0 2.5 0.6 0.8 0.0 2.2 0.5 0.3
9000 3 12 0 5 2 1
0.0 0.0 2.5 0.6 0.8 0.0 2.2 0.5 0.3
";
    let records = decode_ok(&trace(&[history]));
    let kinds: Vec<_> = records.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::Source,
            EventKind::Bank,
            EventKind::Collision,
            EventKind::Termination
        ]
    );

    let bank = &records[1];
    assert_eq!(bank.kind_code, 2006);
    assert_eq!(bank.bank_reason(), Some(BankReason::ImportanceSplit));
    assert_eq!(bank.initial_kind, EventKind::Source);

    let termination = &records[3];
    assert_eq!(
        termination.fields,
        KindFields::Termination {
            termination_type: 12,
            branch: 0,
            cell: 5,
            material: 2
        }
    );
    assert!(records.iter().all(|r| r.history_id == 4));
    assert_eq!(records.iter().filter(|r| r.ends_history()).count(), 1);
}

#[test]
fn test_every_bank_code_collapses_to_bank() {
    for reason in BankReason::ALL {
        let history = format!(
            "1 1000\n{} 0 1 5 5 2 0\n0 0 0 0 0 1 1 1 0\n9000 1 1001 2 5 2 0\n0 0 0 0 0 1 1 1 0\n",
            reason.code()
        );
        let records = decode_ok(&trace(&[history.as_str()]));
        assert_eq!(records[1].kind, EventKind::Bank, "code {}", reason.code());
        assert_eq!(records[1].bank_reason(), Some(reason));
    }
}

#[test]
fn test_unknown_header_kind_is_skipped() {
    let bad = "\
2 1234
9000 0 1 5 5 2 0
0 0 0 0 0 1 1 1 0
";
    let text = trace(&[SCENARIO_A, bad, SCENARIO_B.replacen("2 4000", "3 4000", 1).as_str()]);
    let results: Vec<_> = Decoder::default().decode_str(&text).collect();

    assert!(matches!(
        results[1],
        Err(DecoderError::UnknownEventKind { code: 1234, .. })
    ));
    let ids: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).map(|r| r.history_id).collect();
    assert_eq!(ids, vec![1, 3]);
}

#[test]
fn test_strict_mode_rejects_bad_tokens() {
    let bad = SCENARIO_B.replace("9.75", "9.7.5");
    let text = trace(&[SCENARIO_A, bad.as_str()]);

    let lenient = decode_ok(&text);
    assert_eq!(lenient[1].energy, 0.0);

    let strict = Decoder::new(DecoderConfig::new().strict());
    let results: Vec<_> = strict.decode_str(&text).collect();
    assert_eq!(results.len(), 2);
    assert!(matches!(results[1], Err(DecoderError::Token { .. })));
}

/// Deterministic trace with `histories` histories of 1..=4 events each
fn generated_trace(histories: i64) -> (String, usize) {
    let mut body = String::new();
    let mut events = 0;
    for nps in 1..=histories {
        body.push_str(&format!("{} 1000\n", nps));
        let length = (nps % 4) + 1;
        for step in 0..length {
            let next = if step + 1 == length {
                TERMINATION_MARKER
            } else {
                [3000, 4000, 2008][(step % 3) as usize]
            };
            body.push_str(&format!("{} {} 1 5 5 2 {}\n", next, step, step));
            body.push_str(&format!(
                "{0}.0 {1}.0 0.0 0.0 0.0 1.0 {2}.5 1.0 {1}.25\n",
                nps, step, 10 - step
            ));
            events += 1;
        }
    }
    (trace(&[body.as_str()]), events)
}

#[test]
fn test_counter_invariants_on_generated_trace() {
    let (text, expected_events) = generated_trace(50);
    let mut events = Decoder::default().decode_str(&text);
    let records: Vec<_> = events.by_ref().collect::<Result<_, _>>().unwrap();
    let stats = events.stats();

    assert_eq!(records.len(), expected_events);
    assert_eq!(stats.total_events as usize, records.len());
    assert_eq!(
        stats.total_completed_histories as usize,
        records.iter().filter(|r| r.ends_history()).count()
    );
    assert_eq!(stats.total_completed_histories, 50);
    assert!(records.windows(2).all(|w| w[0].history_id <= w[1].history_id));
    for record in &records {
        assert_eq!(record.fields.kind(), record.kind);
    }
}

#[test]
fn test_redecoding_is_identical() {
    let (text, _) = generated_trace(12);
    let decoder = Decoder::default();
    let first = decode_ok(&text);
    let second: Vec<_> = decoder.decode_str(&text).collect::<Result<_, _>>().unwrap();
    assert_eq!(first, second);

    let mut counts = CountingSink::new();
    let stats = decoder.decode_into(text.as_bytes(), &mut counts).unwrap();
    assert_eq!(stats.total_events, counts.events);
    assert_eq!(stats.total_completed_histories, counts.completed_histories);
}

#[test]
fn test_decode_file_and_missing_source() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(trace(&[SCENARIO_A, SCENARIO_B]).as_bytes()).unwrap();
    file.flush().unwrap();

    let mut counts = CountingSink::new();
    let stats = Decoder::default()
        .decode_file_into(file.path(), &mut counts)
        .unwrap();
    assert_eq!(stats.total_events, 2);
    assert_eq!(counts.count(EventKind::Source), 1);
    assert_eq!(counts.count(EventKind::Collision), 1);

    let err = Decoder::default()
        .decode_file_into(Path::new("/nonexistent/run.ptrac"), &mut counts)
        .unwrap_err();
    assert!(matches!(err, DecoderError::SourceUnavailable { .. }));
    assert!(!err.is_recoverable());
}

#[test]
fn test_custom_prelude_length() {
    let text = format!("extra title line\n{}{}", PREAMBLE, SCENARIO_A);
    let decoder = Decoder::new(DecoderConfig::new().with_prelude_lines(5));
    let records: Vec<_> = decoder.decode_str(&text).collect::<Result<_, _>>().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].energy, 14.1);
}

#[test]
fn test_resync_with_extended_history_headers() {
    let body = "\
1 1000 5
4000 0 1 5 5 2 0
0.0 0.0 0.0
9000 1 8016 2 5 2 1
1.0 1.0 1.0 0.0 0.0 1.0 1.0 1.0 1.0
2 1000 5
9000 0 1 5 5 2 0
1.0 2.0 3.0 0.1 0.2 0.97 14.1 1.0 0.0
3 1000 5
9000 0 1 5 5 2 0
1.0 2.0 3.0 0.1 0.2 0.97 14.1 1.0 0.0
";
    let text = trace(&[body]);
    let mut events = Decoder::default().decode_str(&text);
    let ids: Vec<_> = events
        .by_ref()
        .filter_map(|r| r.ok())
        .map(|r| r.history_id)
        .collect();

    assert_eq!(ids, vec![2, 3]);
    let stats = events.stats();
    assert_eq!(stats.total_events, 2);
    assert_eq!(stats.skipped_lines, 2);
    assert!(!stats.ended_while_resyncing);
}

#[test]
fn test_invalid_utf8_in_preamble() {
    let text = trace(&[SCENARIO_A]);
    let mut bytes = Vec::from(&b"   -1 \xe9\xff\n"[..]);
    bytes.extend_from_slice(text.split_once('\n').unwrap().1.as_bytes());

    let records: Vec<_> = Decoder::default()
        .decode_reader(&bytes[..])
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(records, decode_ok(&text));
}
