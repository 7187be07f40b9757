use approx::assert_abs_diff_eq;
use pinnderiv_core::{CalcOptions, DeGetter, DerivError, DerivMethod, FdConfig, GroupedData, Tensor, ALL_GROUP};

mod common;
use common::{init_logger, linspace_column, sin_net, wave_net};

#[test]
fn test_spring_equation_residual_vanishes() -> Result<(), DerivError> {
    init_logger();
    let mut getter = DeGetter::new(sin_net());
    getter.set_vars(&["t"], &["u"])?;
    getter.set_derivatives(&["u_t", "u_tt"])?;
    getter.set_deriv_method("FD".parse()?)?;

    let t = linspace_column(0.0, 2.0 * std::f64::consts::PI, 100);
    let out = getter.calculate(t.clone(), &CalcOptions::default())?;
    let all = &out[ALL_GROUP];
    assert_eq!(all.len(), 3);

    // u_tt + u = 0 for u = sin(t)
    for r in 0..t.rows() {
        assert_abs_diff_eq!(all["u_tt"].data()[r] + all["u"].data()[r], 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(all["u_t"].data()[r], t.data()[r].cos(), epsilon = 1e-6);
    }
    Ok(())
}

#[test]
fn test_grouped_wall_and_interior() -> Result<(), DerivError> {
    init_logger();
    let mut getter = DeGetter::new(wave_net());
    getter.set_vars(&["x", "y"], &["u", "v"])?;
    getter.set_derivatives(&["u_xx", "u_yy", "v_x"])?;
    getter.set_deriv_method(DerivMethod::FiniteDifference(FdConfig::default().with_steps(vec![1e-3, 1e-3])))?;

    let wall = Tensor::from_rows(&[vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]])?;
    let interior = Tensor::from_rows(&[vec![0.3, 0.4], vec![0.5, 0.5], vec![0.7, 0.1]])?;
    let groups = GroupedData::new().with_group("wall", wall)?.with_group("interior", interior.clone())?;

    let out = getter.calculate(groups, &CalcOptions::target("interior"))?;
    assert_eq!(out.len(), 2);

    let wall_out = &out["wall"];
    assert_eq!(wall_out.keys().collect::<Vec<_>>(), vec!["u", "v"]);
    for t in wall_out.values() {
        assert_eq!(t.shape(), &[4]);
    }

    let interior_out = &out["interior"];
    assert_eq!(
        interior_out.keys().collect::<Vec<_>>(),
        vec!["u", "u_x", "u_xx", "u_y", "u_yy", "v", "v_x"]
    );
    for t in interior_out.values() {
        assert_eq!(t.shape(), &[3]);
    }
    for r in 0..3 {
        let p = interior.row(r)?;
        // u_xx + u_yy = -2u for u = sin(x) cos(y)
        let laplacian = interior_out["u_xx"].data()[r] + interior_out["u_yy"].data()[r];
        assert_abs_diff_eq!(laplacian, -2.0 * p[0].sin() * p[1].cos(), epsilon = 1e-5);
        assert_abs_diff_eq!(interior_out["v_x"].data()[r], p[1], epsilon = 1e-9);
    }
    Ok(())
}

#[test]
fn test_boundary_step_limiter() -> Result<(), DerivError> {
    init_logger();
    // Points in [0, 1]; the distance to the boundary bounds the step
    let config = FdConfig::default()
        .with_steps(vec![0.01])
        .with_step_limiter(|x: &Tensor| {
            let d = x.data().iter().map(|&v| v.min(1.0 - v)).collect();
            Tensor::new(d, vec![x.rows()])
        });
    let mut getter = DeGetter::new(sin_net());
    getter.set_vars(&["x"], &["u"])?;
    getter.set_deriv_method(DerivMethod::FiniteDifference(config))?;
    getter.set_derivatives(&["u_x"])?;

    let x = Tensor::from_column(vec![0.001, 0.5, 0.995]);
    let out = getter.calculate(x.clone(), &CalcOptions::default())?;
    for r in 0..3 {
        assert_abs_diff_eq!(out[ALL_GROUP]["u_x"].data()[r], x.data()[r].cos(), epsilon = 1e-5);
    }

    // A point on the boundary has a zero step bound
    let on_boundary = Tensor::from_column(vec![0.0]);
    assert!(matches!(
        getter.calculate(on_boundary, &CalcOptions::default()),
        Err(DerivError::InvalidStep { .. })
    ));
    Ok(())
}
