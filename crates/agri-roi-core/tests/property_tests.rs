use agri_roi_core::config::AnalysisConfig;
use agri_roi_core::economics::cost_revenue::{CostRevenueModel, Multipliers};
use agri_roi_core::economics::metrics::{calculate_metrics, MetricsParams};
use agri_roi_core::economics::viability::assess_viability;
use agri_roi_core::inputs::{CostMultipliers, RegionalContext, VarietyAttributes};
use agri_roi_core::recommendation::synthesis::{synthesize, RecommendationInputs};
use agri_roi_core::risk::assessment::{assess_risk, RiskWeights};
use agri_roi_core::scenarios::scenario::evaluate_scenarios;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn cents(range: std::ops::Range<i64>) -> impl Strategy<Value = Decimal> {
    range.prop_map(|c| Decimal::new(c, 2))
}

prop_compose! {
    fn any_variety()(
        crop in prop::sample::select(vec!["corn", "soybean", "wheat", "sorghum"]),
        percentile in cents(0..10_001),
        acceptance in cents(0..501),
        disease in 0u32..12,
        stability in cents(0..1_001),
        drought in any::<bool>(),
        heat in any::<bool>(),
    ) -> VarietyAttributes {
        VarietyAttributes {
            variety_name: "prop".into(),
            crop_name: crop.into(),
            yield_potential_percentile: percentile,
            market_acceptance_score: acceptance,
            disease_resistance_count: disease,
            yield_stability_rating: stability,
            drought_tolerant: drought,
            heat_tolerant: heat,
            premium: None,
        }
    }
}

prop_compose! {
    fn any_region()(
        price in cents(50..2_500),
        volatility in cents(0..101),
        weather in cents(0..101),
        yield_multiplier in cents(50..150),
        adjustment in cents(-200..201),
        cost_multiplier in cents(50..300),
    ) -> RegionalContext {
        RegionalContext {
            region_name: "prop".into(),
            crop_name: "prop".into(),
            base_price_per_unit: price,
            price_volatility: volatility,
            yield_multiplier,
            weather_risk: weather,
            yield_volatility_adjustment: adjustment,
            cost_multipliers: CostMultipliers::uniform(cost_multiplier),
            government_programs: vec![],
            expected_insurance_payout_per_acre: Decimal::ZERO,
        }
    }
}

/// NPV, IRR and recommendation score for the base case, with the Monte
/// Carlo inputs pinned so only the deterministic path moves.
fn headline(
    variety: &VarietyAttributes,
    region: &RegionalContext,
) -> (Decimal, Decimal, Decimal) {
    let config = AnalysisConfig::default();
    let params = MetricsParams::from_config(&config);
    let model = CostRevenueModel::new(variety, region, &config);
    let (costs, revenue) = model.build(&Multipliers::BASE);
    let m = calculate_metrics(&costs, &revenue, &params);
    let viability = assess_viability(
        &m,
        region.price_volatility,
        config.horizon_years,
        config.irr_cap,
    );
    let scenarios = evaluate_scenarios(&model, &config.scenarios, &params);
    let recommendation = synthesize(
        &RecommendationInputs {
            economic_score: viability.economic_score,
            base_npv: scenarios.base.npv,
            pessimistic_npv: scenarios.pessimistic.npv,
            weighted_npv: scenarios.weighted_npv(),
            irr: m.irr,
            profitability_index: m.profitability_index,
            payback_years: m.payback_years,
            discounted_payback_years: m.discounted_payback_years,
            horizon_years: config.horizon_years,
            probability_positive_npv: 0.5,
            expected_shortfall: 0.0,
            risk: assess_risk(variety, region, &config.risk_weights),
        },
        &config.recommendation_weights,
    );
    (m.npv, m.irr, recommendation.scores.total)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn npv_rises_with_price_and_falls_with_cost(
        variety in any_variety(),
        region in any_region(),
        uplift in cents(1..200),
    ) {
        let config = AnalysisConfig::default();
        let params = MetricsParams::from_config(&config);
        let base = CostRevenueModel::new(&variety, &region, &config).build(&Multipliers::BASE);
        let base_npv = calculate_metrics(&base.0, &base.1, &params).npv;

        let mut pricier = region.clone();
        pricier.base_price_per_unit += uplift;
        let p = CostRevenueModel::new(&variety, &pricier, &config).build(&Multipliers::BASE);
        prop_assert!(calculate_metrics(&p.0, &p.1, &params).npv >= base_npv);

        let mut costlier = region.clone();
        costlier.cost_multipliers = CostMultipliers::uniform(region.cost_multipliers.seed + uplift);
        let c = CostRevenueModel::new(&variety, &costlier, &config).build(&Multipliers::BASE);
        prop_assert!(calculate_metrics(&c.0, &c.1, &params).npv <= base_npv);
    }

    #[test]
    fn more_yield_or_price_never_lowers_npv_irr_or_score(
        variety in any_variety(),
        region in any_region(),
        percentile_uplift in cents(0..5_000),
        multiplier_uplift in cents(0..50),
        price_uplift in cents(0..200),
    ) {
        let (npv, irr, score) = headline(&variety, &region);

        let mut higher_yield = variety.clone();
        higher_yield.yield_potential_percentile =
            (variety.yield_potential_percentile + percentile_uplift).min(dec!(100));
        let mut richer = region.clone();
        richer.yield_multiplier += multiplier_uplift;
        let (y_npv, y_irr, y_score) = headline(&higher_yield, &richer);
        prop_assert!(y_npv >= npv);
        prop_assert!(y_irr >= irr);
        prop_assert!(y_score >= score);

        let mut pricier = region.clone();
        pricier.base_price_per_unit += price_uplift;
        let (p_npv, p_irr, p_score) = headline(&variety, &pricier);
        prop_assert!(p_npv >= npv);
        prop_assert!(p_irr >= irr);
        prop_assert!(p_score >= score);
    }

    #[test]
    fn scenarios_are_ordered(variety in any_variety(), region in any_region()) {
        let config = AnalysisConfig::default();
        let model = CostRevenueModel::new(&variety, &region, &config);
        let set = evaluate_scenarios(&model, &config.scenarios, &MetricsParams::from_config(&config));
        prop_assert!(set.pessimistic.npv <= set.base.npv);
        prop_assert!(set.base.npv <= set.optimistic.npv);
    }

    #[test]
    fn break_even_yield_and_price_cover_cost(variety in any_variety(), region in any_region()) {
        let config = AnalysisConfig::default();
        let (costs, revenue) = CostRevenueModel::new(&variety, &region, &config).build(&Multipliers::BASE);
        let m = calculate_metrics(&costs, &revenue, &MetricsParams::from_config(&config));
        let total_cost = costs.total();
        if let Some(y) = m.break_even_yield {
            prop_assert!((y * revenue.market_price_per_unit - total_cost).abs() < dec!(0.0001));
        }
        if let Some(p) = m.break_even_price {
            prop_assert!((p * revenue.expected_yield_per_acre - total_cost).abs() < dec!(0.0001));
        }
    }

    #[test]
    fn risk_scores_stay_in_unit_interval(variety in any_variety(), region in any_region()) {
        let r = assess_risk(&variety, &region, &RiskWeights::default());
        for score in [r.weather_risk, r.market_volatility_risk, r.yield_volatility_risk, r.overall_risk] {
            prop_assert!(score >= Decimal::ZERO && score <= Decimal::ONE);
        }
    }
}
