use goal_planner::{
    config::Config,
    currency::{format_amount, CurrencyCode, RateTable},
    PlanError,
};

#[test]
fn default_table_uses_uah_base() {
    let table = RateTable::default();
    assert_eq!(table.base().as_str(), "UAH");
    assert_eq!(table.to_base(100.0, &CurrencyCode::new("USD")).unwrap(), 4100.0);
    assert_eq!(table.to_base(10.0, &CurrencyCode::new("eur")).unwrap(), 440.0);
    assert_eq!(table.to_base(10.0, &CurrencyCode::new(" uah ")).unwrap(), 10.0);
}

#[test]
fn configured_rates_replace_defaults() {
    let mut config = Config::default();
    config.set_value("base_currency", "usd").unwrap();
    config.rates.clear();
    config.set_value("rate.uah", "0.025").unwrap();

    let table = config.rate_table().unwrap();
    assert_eq!(table.codes(), vec!["USD", "UAH"]);
    assert!((table.to_base(4000.0, &CurrencyCode::new("UAH")).unwrap() - 100.0).abs() < 1e-9);
    assert!(matches!(
        table.to_base(1.0, &CurrencyCode::new("EUR")),
        Err(PlanError::UnsupportedCurrency(_))
    ));
}

#[test]
fn amounts_render_with_symbol_and_grouping() {
    assert_eq!(format_amount(12_345.5, &CurrencyCode::new("UAH")), "₴12,345.50");
    assert_eq!(format_amount(0.0, &CurrencyCode::new("EUR")), "€0.00");
    assert_eq!(format_amount(7.0, &CurrencyCode::new("CHF")), "CHF7.00");
}
