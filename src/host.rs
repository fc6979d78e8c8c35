//! JSON-lines request loop for the host binary.
//!
//! One `PatientAttributes` object per input line, one response object per
//! output line. Per-line failures become `{"error": ...}` responses; only an
//! I/O error on the streams ends the loop.

use std::io::{BufRead, Read, Write};

use serde::Serialize;

use crate::application::PredictionService;
use crate::domain::{PatientAttributes, PredictionResult};
use crate::ports::Classifier;
use crate::CardioError;

/// Longest accepted request line, in bytes, excluding the newline.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Wire shape of one response line.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Response {
    Prediction {
        #[serde(flatten)]
        result: PredictionResult,
        message: &'static str,
    },
    Error {
        error: String,
    },
}

impl From<&Result<PredictionResult, CardioError>> for Response {
    fn from(outcome: &Result<PredictionResult, CardioError>) -> Self {
        match outcome {
            Ok(result) => Self::Prediction {
                result: *result,
                message: result.message(),
            },
            Err(e) => Self::Error {
                error: e.user_message(),
            },
        }
    }
}

/// Counters for one `serve` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeStats {
    pub answered: usize,
    pub rejected: usize,
}

enum Line {
    Eof,
    Complete(Vec<u8>),
    TooLong,
}

/// Read one line of at most `limit` bytes. An overlong line is consumed up
/// to and including its newline without being buffered.
fn read_line<R: BufRead>(reader: &mut R, limit: usize) -> std::io::Result<Line> {
    let mut buf = Vec::new();
    let read = (&mut *reader)
        .take(limit as u64 + 1)
        .read_until(b'\n', &mut buf)?;
    if read == 0 {
        return Ok(Line::Eof);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        return Ok(Line::Complete(buf));
    }
    if buf.len() <= limit {
        // Last line without a trailing newline.
        return Ok(Line::Complete(buf));
    }

    loop {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            break;
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                break;
            }
            None => {
                let len = available.len();
                reader.consume(len);
            }
        }
    }
    Ok(Line::TooLong)
}

fn handle_line<C: Classifier>(
    service: &PredictionService<C>,
    line: &[u8],
) -> Result<PredictionResult, CardioError> {
    let attributes = PatientAttributes::from_slice(line)?;
    service.assess(&attributes)
}

/// Answer every request line from `reader` on `writer`.
///
/// Blank lines are skipped. Each response is flushed as soon as it is
/// written.
///
/// # Errors
/// Returns an error only if reading from `reader` or writing to `writer`
/// fails.
pub fn serve<C, R, W>(
    service: &PredictionService<C>,
    mut reader: R,
    mut writer: W,
) -> std::io::Result<ServeStats>
where
    C: Classifier,
    R: BufRead,
    W: Write,
{
    let mut stats = ServeStats::default();
    let mut line_no = 0usize;

    loop {
        line_no += 1;
        let outcome = match read_line(&mut reader, MAX_LINE_BYTES)? {
            Line::Eof => break,
            Line::TooLong => Err(CardioError::LineTooLong {
                limit: MAX_LINE_BYTES,
            }),
            Line::Complete(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => continue,
            Line::Complete(bytes) => handle_line(service, &bytes),
        };

        match &outcome {
            Ok(_) => stats.answered += 1,
            Err(e) => {
                stats.rejected += 1;
                if e.is_fatal() {
                    tracing::error!(line = line_no, "Request failed: {}", e);
                } else {
                    tracing::warn!(line = line_no, "Request rejected");
                }
            }
        }

        serde_json::to_writer(&mut writer, &Response::from(&outcome))?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }

    tracing::debug!(
        answered = stats.answered,
        rejected = stats.rejected,
        "Input closed"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ClassifierError;
    use crate::domain::FEATURE_COUNT;
    use std::io::Cursor;
    use std::sync::Arc;

    /// Positive when no vessels are colored.
    struct VesselRule;

    impl Classifier for VesselRule {
        fn n_features(&self) -> usize {
            FEATURE_COUNT
        }

        fn predict_batch(&self, samples: &[&[f64]]) -> Result<Vec<i64>, ClassifierError> {
            Ok(samples.iter().map(|s| i64::from(s[11] == 0.0)).collect())
        }
    }

    const VALID: &str = r#"{"age":63,"sex":"Male","chest_pain_type":"Typical Angina","resting_blood_pressure":145,"serum_cholesterol":233,"fasting_blood_sugar_high":"True","resting_ecg":"Normal","max_heart_rate":150,"exercise_induced_angina":"No","st_depression":2.3,"st_slope":"Downsloping","vessels_colored_count":"0","thal_result":"Fixed Defect"}"#;

    fn run(input: &[u8]) -> (Vec<serde_json::Value>, ServeStats) {
        let service = PredictionService::new(Arc::new(VesselRule)).expect("Should build");
        let mut out = Vec::new();
        let stats = serve(&service, Cursor::new(input.to_vec()), &mut out).expect("serve");
        let text = String::from_utf8(out).expect("utf8 output");
        let lines = text
            .lines()
            .map(|l| serde_json::from_str(l).expect("json response"))
            .collect();
        (lines, stats)
    }

    #[test]
    fn test_success_response_shape() {
        let (lines, stats) = run(format!("{VALID}\n").as_bytes());
        assert_eq!(
            lines,
            vec![serde_json::json!({
                "label": 1,
                "verdict": "positive",
                "message": "Positive for cardiovascular disease"
            })]
        );
        assert_eq!(stats, ServeStats { answered: 1, rejected: 0 });
    }

    #[test]
    fn test_blank_lines_produce_no_output() {
        let (lines, _) = run(format!("\n   \n{VALID}\r\n\n").as_bytes());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["verdict"], "positive");
    }

    #[test]
    fn test_malformed_json_rejected_per_line() {
        let (lines, stats) = run(format!("{{ not json\n{VALID}\n").as_bytes());
        assert_eq!(lines.len(), 2);
        let error = lines[0]["error"].as_str().expect("error message");
        assert!(error.starts_with("Malformed request"));
        assert_eq!(lines[1]["label"], 1);
        assert_eq!(stats, ServeStats { answered: 1, rejected: 1 });
    }

    #[test]
    fn test_invalid_utf8_line_does_not_stop_the_loop() {
        let mut input = format!("{VALID}\n").into_bytes();
        input.extend_from_slice(b"{\"sex\":\"\xff\"}\n");
        input.extend_from_slice(format!("{VALID}\n").as_bytes());

        let (lines, stats) = run(&input);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["label"], 1);
        assert!(lines[1]["error"].is_string());
        assert_eq!(lines[2]["label"], 1);
        assert_eq!(stats, ServeStats { answered: 2, rejected: 1 });
    }

    #[test]
    fn test_invalid_input_names_field() {
        let record = VALID.replace(r#""vessels_colored_count":"0""#, r#""vessels_colored_count":"4""#);
        let (lines, _) = run(format!("{record}\n").as_bytes());
        let error = lines[0]["error"].as_str().expect("error message");
        assert!(error.contains("vessels_colored_count"));
    }

    #[test]
    fn test_overlong_line_rejected_and_skipped() {
        let mut input = vec![b' '; MAX_LINE_BYTES + 10];
        input.push(b'\n');
        input.extend_from_slice(format!("{VALID}\n").as_bytes());

        let (lines, stats) = run(&input);
        assert_eq!(lines.len(), 2);
        let error = lines[0]["error"].as_str().expect("error message");
        assert!(error.contains("too long"));
        assert_eq!(lines[1]["label"], 1);
        assert_eq!(stats, ServeStats { answered: 1, rejected: 1 });
    }

    #[test]
    fn test_read_line_limits() {
        let mut reader = Cursor::new(b"abcd\nabcdef\nab".to_vec());
        assert!(matches!(read_line(&mut reader, 4).expect("read"), Line::Complete(b) if b == b"abcd"));
        assert!(matches!(read_line(&mut reader, 4).expect("read"), Line::TooLong));
        assert!(matches!(read_line(&mut reader, 4).expect("read"), Line::Complete(b) if b == b"ab"));
        assert!(matches!(read_line(&mut reader, 4).expect("read"), Line::Eof));
    }

    #[test]
    fn test_final_line_without_newline() {
        let (lines, _) = run(VALID.as_bytes());
        assert_eq!(lines.len(), 1);
    }
}
