// Spring equation u_tt + u = 0 evaluated with finite differences.
//
// Run with: cargo run -p pinnderiv-core --example spring_fd

use pinnderiv_core::{CalcOptions, DeGetter, DerivError, DerivMethod, FdConfig, FnNetwork, GroupedData, Tensor};
use std::sync::Arc;

fn main() -> Result<(), DerivError> {
    env_logger::init();

    // Stand-in for a trained network: the exact solution with u(0) = 0, u_t(0) = 1
    let net = Arc::new(FnNetwork::new(1, 1, |p| vec![p[0].sin()]));

    let mut getter = DeGetter::new(net);
    getter.set_vars(&["t"], &["u"])?;
    getter.set_derivatives(&["u_t", "u_tt"])?;
    getter.set_deriv_method(DerivMethod::FiniteDifference(
        FdConfig::default().with_steps(vec![1e-3]).with_target_group("collocation"),
    ))?;

    let n = 998;
    let t_col = Tensor::from_column((0..n).map(|i| 2.0 * std::f64::consts::PI * (i as f64 + 0.5) / n as f64).collect());
    let t_data = Tensor::from_column(vec![0.0]);
    let data = GroupedData::new()
        .with_group("initial", t_data)?
        .with_group("collocation", t_col)?;

    let out = getter.calculate(data, &CalcOptions::default())?;

    let col = &out["collocation"];
    let residual = col["u_tt"]
        .data()
        .iter()
        .zip(col["u"].data())
        .map(|(u_tt, u)| (u_tt + u).powi(2))
        .sum::<f64>()
        / n as f64;
    let initial = out["initial"]["u"].data()[0].powi(2);

    println!("Registered derivatives: {:?}", getter.registry().map(|r| r.iter().map(|(d, i)| (d.name(), i.to_vec())).collect::<Vec<_>>()));
    println!("Residual loss {:.3e}, initial condition loss {:.3e}", residual, initial);
    Ok(())
}
