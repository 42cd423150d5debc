use std::collections::HashMap;
use std::sync::Arc;

use proptest::prelude::*;

use automac::actions::NullActions;
use automac::fuzzy::partial_ratio;
use automac::script::block::find_block_end;
use automac::script::expr::eval_str;
use automac::script::subst::substitute;
use automac::script::{Interpreter, RunState, Value};

fn quiet_interp() -> Interpreter {
    Interpreter::new(
        Arc::new(NullActions),
        Arc::new(|_: &str| {}),
        Arc::new(|_: &str| {}),
        Arc::new(|_: &str| {}),
    )
}

proptest! {
    /// `var x <n>` followed by `eval y = $x * 2` always yields y == 2n.
    #[test]
    fn eval_doubles_any_int(x in any::<i32>()) {
        let mut interp = quiet_interp();
        let state = interp.run(&format!("var x {x}\neval y = $x * 2"));
        prop_assert_eq!(state, RunState::FinishedNormally);
        prop_assert_eq!(interp.get_var("y"), Some(&Value::Int(2 * i64::from(x))));
    }
}

proptest! {
    /// The expression pipeline returns Ok or Err on arbitrary input; it never
    /// panics.
    #[test]
    fn expression_evaluator_never_panics(s in "\\PC*") {
        let _ = eval_str(&s);
    }
}

proptest! {
    /// Substitution without `$` references is the identity.
    #[test]
    fn substitution_without_refs_is_identity(s in "[^$]*") {
        let vars = HashMap::new();
        prop_assert_eq!(substitute(&s, &vars).unwrap(), s);
    }
}

proptest! {
    /// Fuzzy scores stay within 0..=100 for arbitrary inputs.
    #[test]
    fn partial_ratio_is_bounded(needle in "\\PC{0,30}", hay in "\\PC{0,60}") {
        prop_assert!(partial_ratio(&needle, &hay) <= 100);
    }
}

proptest! {
    /// A balanced stack of nested loops always resolves, landing one past the
    /// final `endloop`.
    #[test]
    fn balanced_nesting_always_resolves(depth in 1usize..12, filler in 0usize..5) {
        let mut lines: Vec<String> = Vec::new();
        for _ in 1..depth {
            lines.push("loop 2".to_owned());
            for _ in 0..filler {
                lines.push("log tick".to_owned());
            }
        }
        for _ in 0..depth {
            lines.push("endloop".to_owned());
        }
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        // Scanning from index 0 as if the opening `loop` sat on line -1.
        let end = find_block_end(&refs, 0, &["loop"], &["endloop"]).unwrap();
        prop_assert_eq!(end, refs.len());
    }
}

proptest! {
    /// Unbalanced nesting is always a structural fault, never a panic or a
    /// bogus index.
    #[test]
    fn missing_end_always_errors(depth in 1usize..12) {
        let mut lines: Vec<String> = vec!["loop 2".to_owned(); depth];
        lines.push("log body".to_owned());
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        prop_assert!(find_block_end(&refs, 0, &["loop"], &["endloop"]).is_err());
    }
}
