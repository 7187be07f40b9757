use pinnderiv_core::{
    AutodiffCapability, CalcOptions, DeGetter, DerivError, DerivMethod, DerivRegistry, GroupedData, Network, Tensor,
};
use std::collections::HashMap;
use std::sync::Arc;

mod common;
use common::{init_logger, linspace_column, sin_net};

/// Exact derivatives of u = sin(x): the k-th derivative is sin(x + k pi/2).
#[derive(Debug)]
struct ExactSin;

impl AutodiffCapability for ExactSin {
    fn derivatives(
        &self,
        _net: &dyn Network,
        registry: &DerivRegistry,
        x: &Tensor,
    ) -> Result<HashMap<Vec<usize>, Tensor>, DerivError> {
        let mut out = HashMap::new();
        for (deriv, idx) in registry.derivatives() {
            let shift = deriv.order() as f64 * std::f64::consts::FRAC_PI_2;
            let values: Vec<f64> = x.data().iter().map(|v| (v + shift).sin()).collect();
            // Column-shaped output is accepted as well
            out.insert(idx.to_vec(), Tensor::from_column(values));
        }
        Ok(out)
    }
}

#[test]
fn test_ad_and_fd_agree() -> Result<(), DerivError> {
    init_logger();
    let derivatives = ["u_x", "u_xx"];
    let x = linspace_column(-1.0, 1.0, 20);

    let mut ad = DeGetter::new(sin_net()).with_autodiff(Arc::new(ExactSin));
    ad.set_vars(&["x"], &["u"])?;
    ad.set_derivatives(&derivatives)?;
    assert_eq!(ad.engine_name(), Some("AD"));
    let ad_out = ad.calculate(x.clone(), &CalcOptions::default())?;

    let mut fd = DeGetter::new(sin_net());
    fd.set_vars(&["x"], &["u"])?;
    fd.set_derivatives(&derivatives)?;
    fd.set_deriv_method("fd".parse::<DerivMethod>()?)?;
    let fd_out = fd.calculate(x, &CalcOptions::default())?;

    assert_eq!(ad_out["all"].keys().collect::<Vec<_>>(), fd_out["all"].keys().collect::<Vec<_>>());
    for (name, ad_tensor) in &ad_out["all"] {
        let fd_tensor = &fd_out["all"][name];
        assert_eq!(ad_tensor.shape(), fd_tensor.shape());
        for (a, f) in ad_tensor.data().iter().zip(fd_tensor.data()) {
            assert!((a - f).abs() < 1e-5, "{}: {} vs {}", name, a, f);
        }
    }
    Ok(())
}

#[test]
fn test_ad_third_order_allowed() -> Result<(), DerivError> {
    let mut getter = DeGetter::new(sin_net()).with_autodiff(Arc::new(ExactSin));
    getter.set_vars(&["x"], &["u"])?;
    getter.set_derivatives(&["u_xxx"])?;
    let groups = GroupedData::new()
        .with_group("left", Tensor::from_column(vec![0.0]))?
        .with_group("right", Tensor::from_column(vec![1.0, 2.0]))?;
    let out = getter.calculate(groups, &CalcOptions::default())?;
    assert_eq!(out["left"].len(), 4);
    assert_eq!(out["right"]["u_xxx"].shape(), &[2]);
    assert!((out["left"]["u_xxx"].data()[0] + 1.0).abs() < 1e-12);

    // Switching to FD fails fast on the third-order entry
    assert!(matches!(
        getter.set_deriv_method_by_name("FD"),
        Err(DerivError::UnsupportedDerivative { .. })
    ));
    assert_eq!(getter.engine_name(), Some("AD"));
    Ok(())
}
