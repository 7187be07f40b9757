// pinnderiv-core/src/symbols_test.rs

use super::*;
use std::collections::HashSet;

fn vars() -> (VariableSet, VariableSet) {
    let inputs = VariableSet::new(VarKind::Input, &["x", "y", "t"]).expect("inputs");
    let outputs = VariableSet::new(VarKind::Output, &["u", "v"]).expect("outputs");
    (inputs, outputs)
}

#[test]
fn test_parse_second_order() -> Result<(), DerivError> {
    let (inputs, outputs) = vars();
    let d = Deriv::parse("u_xx", &inputs, &outputs)?;
    assert_eq!(d.output().name(), "u");
    assert_eq!(d.order(), 2);
    assert!(!d.is_mixed());
    assert_eq!(d.name(), "u_xx");
    Ok(())
}

#[test]
fn test_parse_rejects_separator_count() {
    let (inputs, outputs) = vars();
    for spec in ["uxx", "u_x_x", "u__x"] {
        match Deriv::parse(spec, &inputs, &outputs) {
            Err(DerivError::MalformedDerivative { spec: s, .. }) => assert_eq!(s, spec),
            other => panic!("Expected MalformedDerivative for {}, got {:?}", spec, other),
        }
    }
}

#[test]
fn test_parse_rejects_empty_input_part() {
    let (inputs, outputs) = vars();
    assert!(matches!(
        Deriv::parse("u_", &inputs, &outputs),
        Err(DerivError::MalformedDerivative { .. })
    ));
}

#[test]
fn test_parse_rejects_undeclared_variables() {
    let (inputs, outputs) = vars();
    match Deriv::parse("w_x", &inputs, &outputs) {
        Err(DerivError::UnknownVariable { name, kind }) => {
            assert_eq!(name, "w");
            assert_eq!(kind, "output");
        }
        other => panic!("Expected UnknownVariable, got {:?}", other),
    }
    match Deriv::parse("u_xz", &inputs, &outputs) {
        Err(DerivError::UnknownVariable { name, kind }) => {
            assert_eq!(name, "z");
            assert_eq!(kind, "input");
        }
        other => panic!("Expected UnknownVariable, got {:?}", other),
    }
}

#[test]
fn test_tokenize_prefers_longest_name() -> Result<(), DerivError> {
    let inputs = VariableSet::new(VarKind::Input, &["x", "xi"])?;
    let outputs = VariableSet::new(VarKind::Output, &["phi"])?;
    let d = Deriv::parse("phi_xix", &inputs, &outputs)?;
    let names: Vec<&str> = d.inputs().iter().map(|v| v.name()).collect();
    assert_eq!(names, vec!["xi", "x"]);
    Ok(())
}

#[test]
fn test_tokenize_backtracks_from_dead_end() -> Result<(), DerivError> {
    let inputs = VariableSet::new(VarKind::Input, &["x", "xy", "yz"])?;
    let outputs = VariableSet::new(VarKind::Output, &["u"])?;
    // "xy" first leaves "z", which matches nothing
    let d = Deriv::parse("u_xyz", &inputs, &outputs)?;
    let names: Vec<&str> = d.inputs().iter().map(|v| v.name()).collect();
    assert_eq!(names, vec!["x", "yz"]);

    match inputs.tokenize("xyw") {
        Err(DerivError::UnknownVariable { name, .. }) => assert_eq!(name, "w"),
        other => panic!("Expected UnknownVariable, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_previous_walks_down_to_output() -> Result<(), DerivError> {
    let (inputs, outputs) = vars();
    let d = Deriv::parse("u_xyt", &inputs, &outputs)?;
    let p1 = d.previous()?;
    assert_eq!(p1.name(), "u_xy");
    let p2 = p1.previous()?;
    assert_eq!(p2.name(), "u_x");
    let p3 = p2.previous()?;
    assert_eq!(p3.name(), "u");
    assert_eq!(p3.order(), 0);
    assert!(matches!(p3.previous(), Err(DerivError::NoPreviousDerivative(ref n)) if n == "u"));
    Ok(())
}

#[test]
fn test_mixed_partials_compare_as_multiset() -> Result<(), DerivError> {
    let (inputs, outputs) = vars();
    let xy = Deriv::parse("u_xy", &inputs, &outputs)?;
    let yx = Deriv::parse("u_yx", &inputs, &outputs)?;
    let vx = Deriv::parse("v_xy", &inputs, &outputs)?;
    assert!(xy.is_mixed());
    assert_eq!(xy, yx);
    assert_ne!(xy, vx);
    // Written order is kept for display
    assert_eq!(yx.name(), "u_yx");
    let set: HashSet<Deriv> = [xy, yx].into_iter().collect();
    assert_eq!(set.len(), 1);
    Ok(())
}

#[test]
fn test_variable_set_rejects_duplicates_and_bad_names() {
    assert!(matches!(
        VariableSet::new(VarKind::Input, &["x", "x"]),
        Err(DerivError::DuplicateVariable { .. })
    ));
    assert!(matches!(
        VariableSet::new(VarKind::Output, &["u_1"]),
        Err(DerivError::InvalidVariableName(_))
    ));
    assert!(matches!(
        VariableSet::new(VarKind::Output, &[""]),
        Err(DerivError::InvalidVariableName(_))
    ));
    // The same name may be both an input and an output
    assert!(VariableSet::new(VarKind::Input, &["u"]).is_ok());
}
