//! Pose scripts for headless replay.
//!
//! One s-expression plist per line:
//!
//! ```text
//! ; comment
//! (:tick 3 :source "left" :euler (1.0 0.0 0.0))
//! (:tick 5 :source "left" :position (0.0 0.1 0.0))
//! (:tick 8 :source "left" :poll nil)
//! ```
//!
//! `:euler` and `:position` set absolute values at the start of the tick;
//! `:poll` toggles the source's caller.

use lexpr::Value;
use thiserror::Error;
use tracing::warn;

use crate::source::SourceKey;

/// Built-in demo: a left-hand twist, a two-axis turn, a drag, then a pause.
pub const DEMO_SCRIPT: &str = r#"; left hand twists about X
(:tick 2 :source "left" :euler (2.0 0.0 0.0))
; then turns about Y and Z together
(:tick 5 :source "left" :euler (2.0 3.0 3.0))
; then is dragged without rotating further
(:tick 8 :source "left" :position (0.0 0.0 0.2))
; right hand rolls on its own
(:tick 3 :source "right" :euler (0.0 0.0 4.0))
; right caller stops polling
(:tick 10 :source "right" :poll nil)
"#;

/// Rejected script line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("line {line}: malformed s-expression: {reason}")]
    Malformed { line: usize, reason: String },
    #[error("line {line}: missing :{key}")]
    MissingKey { line: usize, key: &'static str },
    #[error("line {line}: :{key} must be {expected}")]
    BadValue {
        line: usize,
        key: &'static str,
        expected: &'static str,
    },
    #[error("line {line}: step sets nothing (need :euler, :position or :poll)")]
    EmptyStep { line: usize },
}

/// Highest tick a script may schedule a step on.
pub const MAX_TICK: u64 = 1_000_000;

/// One scripted change to a source.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptStep {
    pub tick: u64,
    pub source: SourceKey,
    pub euler_deg: Option<[f32; 3]>,
    pub position: Option<[f32; 3]>,
    pub poll: Option<bool>,
}

/// Ordered list of steps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    steps: Vec<ScriptStep>,
}

impl Script {
    /// Parse a script.  Blank lines and `;` comments are skipped.
    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        let mut steps = Vec::new();
        for (i, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            steps.push(parse_step(i + 1, line)?);
        }
        // stable: same-tick steps keep file order
        steps.sort_by_key(|s| s.tick);
        Ok(Self { steps })
    }

    /// The built-in demo script.
    pub fn demo() -> Self {
        match Self::parse(DEMO_SCRIPT) {
            Ok(script) => script,
            Err(e) => {
                warn!("Built-in demo script rejected: {}", e);
                Self::default()
            }
        }
    }

    pub fn steps(&self) -> &[ScriptStep] {
        &self.steps
    }

    /// Steps scheduled for `tick`.
    pub fn steps_at(&self, tick: u64) -> impl Iterator<Item = &ScriptStep> {
        self.steps.iter().filter(move |s| s.tick == tick)
    }

    /// Distinct sources in order of first appearance.
    pub fn sources(&self) -> Vec<SourceKey> {
        let mut sources: Vec<SourceKey> = Vec::new();
        for step in &self.steps {
            if !sources.contains(&step.source) {
                sources.push(step.source.clone());
            }
        }
        sources
    }

    /// Tick of the last step (0 for an empty script).
    pub fn last_tick(&self) -> u64 {
        self.steps.last().map(|s| s.tick).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

fn parse_step(line: usize, text: &str) -> Result<ScriptStep, ScriptError> {
    let value = lexpr::from_str(text).map_err(|e| ScriptError::Malformed {
        line,
        reason: e.to_string(),
    })?;

    let tick = match plist_get(&value, "tick") {
        Some(v) => as_u64(v)
            .filter(|t| *t <= MAX_TICK)
            .ok_or(ScriptError::BadValue {
                line,
                key: "tick",
                expected: "an integer from 0 to 1000000",
            })?,
        None => return Err(ScriptError::MissingKey { line, key: "tick" }),
    };

    let source = match plist_get(&value, "source") {
        Some(v) => as_name(v).ok_or(ScriptError::BadValue {
            line,
            key: "source",
            expected: "a string or symbol",
        })?,
        None => return Err(ScriptError::MissingKey { line, key: "source" }),
    };

    let euler_deg = optional_vec3(&value, line, "euler")?;
    let position = optional_vec3(&value, line, "position")?;
    let poll = match plist_get(&value, "poll") {
        Some(v) => Some(as_bool(v).ok_or(ScriptError::BadValue {
            line,
            key: "poll",
            expected: "t or nil",
        })?),
        None => None,
    };

    if euler_deg.is_none() && position.is_none() && poll.is_none() {
        return Err(ScriptError::EmptyStep { line });
    }

    Ok(ScriptStep {
        tick,
        source: SourceKey::new(source),
        euler_deg,
        position,
        poll,
    })
}

fn optional_vec3(
    value: &Value,
    line: usize,
    key: &'static str,
) -> Result<Option<[f32; 3]>, ScriptError> {
    match plist_get(value, key) {
        Some(v) => as_vec3(v).map(Some).ok_or(ScriptError::BadValue {
            line,
            key,
            expected: "a list of three numbers",
        }),
        None => Ok(None),
    }
}

/// Find the value after `:key` in a plist.
/// Accepts both `Value::Keyword("key")` (elisp parser) and
/// `Value::Symbol(":key")` (default parser) forms.
fn plist_get<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    while let Value::Cons(pair) = current {
        let is_key = match pair.car() {
            Value::Keyword(k) => k.as_ref() == key,
            Value::Symbol(s) => s.as_ref() == prefixed,
            _ => false,
        };
        if is_key {
            return match pair.cdr() {
                Value::Cons(next) => Some(next.car()),
                _ => None,
            };
        }
        current = pair.cdr();
    }
    None
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

fn as_f32(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        _ => None,
    }
}

fn as_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.to_string()),
        Value::Symbol(s) => Some(s.to_string()),
        Value::Keyword(k) => Some(k.to_string()),
        _ => None,
    }
}

/// Treats `t`/`#t` as true and `nil`/`#f`/`()` as false.
fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Null | Value::Nil => Some(false),
        Value::Symbol(s) => match &**s {
            "t" => Some(true),
            "nil" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Three numbers in a proper list.
fn as_vec3(value: &Value) -> Option<[f32; 3]> {
    let mut out = [0.0f32; 3];
    let mut count = 0;
    let mut current = value;
    while let Value::Cons(pair) = current {
        if count == 3 {
            return None;
        }
        out[count] = as_f32(pair.car())?;
        count += 1;
        current = pair.cdr();
    }
    if count == 3 && matches!(current, Value::Null | Value::Nil) {
        Some(out)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rotation_step() {
        let script = Script::parse("(:tick 3 :source \"left\" :euler (1.0 0.0 -2.5))")
            .expect("valid script");
        assert_eq!(
            script.steps(),
            &[ScriptStep {
                tick: 3,
                source: "left".into(),
                euler_deg: Some([1.0, 0.0, -2.5]),
                position: None,
                poll: None,
            }]
        );
    }

    #[test]
    fn test_integers_accepted_in_vectors() {
        let script = Script::parse("(:tick 1 :source left :position (0 1 2))")
            .expect("valid script");
        assert_eq!(script.steps()[0].position, Some([0.0, 1.0, 2.0]));
        assert_eq!(script.steps()[0].source.as_str(), "left");
    }

    #[test]
    fn test_poll_flags() {
        let script = Script::parse(
            "(:tick 1 :source \"left\" :poll nil)\n(:tick 2 :source \"left\" :poll t)",
        )
        .expect("valid script");
        assert_eq!(script.steps()[0].poll, Some(false));
        assert_eq!(script.steps()[1].poll, Some(true));
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let script = Script::parse("; header\n\n   \n(:tick 0 :source \"r\" :poll t)\n")
            .expect("valid script");
        assert_eq!(script.steps().len(), 1);
    }

    #[test]
    fn test_steps_sorted_by_tick() {
        let script = Script::parse(
            "(:tick 5 :source \"a\" :poll t)\n(:tick 1 :source \"b\" :poll t)\n(:tick 5 :source \"c\" :poll t)",
        )
        .expect("valid script");
        let order: Vec<&str> = script.steps().iter().map(|s| s.source.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
        assert_eq!(script.last_tick(), 5);
        assert_eq!(script.steps_at(5).count(), 2);
    }

    #[test]
    fn test_sources_in_first_appearance_order() {
        let script = Script::demo();
        assert_eq!(
            script.sources(),
            vec![SourceKey::from("left"), SourceKey::from("right")]
        );
    }

    #[test]
    fn test_demo_parses() {
        let script = Script::parse(DEMO_SCRIPT).expect("demo script is valid");
        assert!(!script.is_empty());
        assert_eq!(script.last_tick(), 10);
    }

    #[test]
    fn test_missing_tick() {
        let err = Script::parse("(:source \"left\" :poll t)").unwrap_err();
        assert_eq!(err, ScriptError::MissingKey { line: 1, key: "tick" });
    }

    #[test]
    fn test_missing_source_reports_line() {
        let err = Script::parse("; c\n(:tick 1 :poll t)").unwrap_err();
        assert_eq!(err, ScriptError::MissingKey { line: 2, key: "source" });
    }

    #[test]
    fn test_short_vector_rejected() {
        let err = Script::parse("(:tick 1 :source \"left\" :euler (1.0 2.0))").unwrap_err();
        assert!(matches!(err, ScriptError::BadValue { key: "euler", .. }), "got {:?}", err);
    }

    #[test]
    fn test_negative_tick_rejected() {
        let err = Script::parse("(:tick -1 :source \"left\" :poll t)").unwrap_err();
        assert!(matches!(err, ScriptError::BadValue { key: "tick", .. }), "got {:?}", err);
    }

    #[test]
    fn test_tick_past_bound_rejected() {
        let err = Script::parse("(:tick 18446744073709551615 :source \"left\" :poll t)")
            .unwrap_err();
        assert!(matches!(err, ScriptError::BadValue { key: "tick", .. }), "got {:?}", err);
        let at_bound = format!("(:tick {} :source \"left\" :poll t)", MAX_TICK);
        assert_eq!(Script::parse(&at_bound).map(|s| s.last_tick()), Ok(MAX_TICK));
    }

    #[test]
    fn test_empty_step_rejected() {
        let err = Script::parse("(:tick 1 :source \"left\")").unwrap_err();
        assert_eq!(err, ScriptError::EmptyStep { line: 1 });
    }

    #[test]
    fn test_malformed_line() {
        let err = Script::parse("(:tick 1 :source").unwrap_err();
        assert!(matches!(err, ScriptError::Malformed { line: 1, .. }), "got {:?}", err);
    }
}
