use clap::Args;
use dealbot::config::AppConfig;
use dealbot::error::AppError;
use dealbot::evaluation::{EvaluationEngine, EvaluationResult, ExitStrategy, Facts};

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// After-repair value of the property
    #[arg(long)]
    pub(crate) arv: f64,
    /// Estimated repair cost
    #[arg(long)]
    pub(crate) repairs: f64,
    #[arg(long)]
    pub(crate) address: Option<String>,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) monthly_taxes: f64,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) insurance: f64,
    /// Price offered to the seller
    #[arg(long, default_value_t = 0.0)]
    pub(crate) cash_offer: f64,
    /// Price an end buyer would pay
    #[arg(long, default_value_t = 0.0)]
    pub(crate) investor_cash_price: f64,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) reinstatement_amount: f64,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) cash_for_equity: f64,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) market_rent: f64,
    /// Seller's current monthly mortgage payment
    #[arg(long, default_value_t = 0.0)]
    pub(crate) mortgage_payment: f64,
    /// Print the full evaluation as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

impl EvaluateArgs {
    fn facts(&self) -> Facts {
        Facts {
            address: self.address.clone(),
            arv: self.arv,
            repairs: self.repairs,
            monthly_taxes: self.monthly_taxes,
            insurance: self.insurance,
            cash_offer: self.cash_offer,
            investor_cash_price: self.investor_cash_price,
            reinstatement_amount: self.reinstatement_amount,
            cash_for_equity: self.cash_for_equity,
            market_rent: self.market_rent,
            mortgage_payment: self.mortgage_payment,
        }
    }
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let engine = EvaluationEngine::new(config.evaluation);
    let facts = args.facts();
    let result = engine.evaluate(&facts)?;

    if args.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Evaluation payload unavailable: {err}"),
        }
        return Ok(());
    }

    for line in render(facts.address.as_deref(), &result) {
        println!("{line}");
    }
    Ok(())
}

fn render(address: Option<&str>, result: &EvaluationResult) -> Vec<String> {
    let base = &result.base;
    let mut lines = vec![
        format!("Deal evaluation: {}", address.unwrap_or("(no address)")),
        format!(
            "- ARV ${:.0} | repairs ${:.0} | {:.0}% of ARV ${:.0}",
            base.arv,
            base.repairs,
            base.offer_margin * 100.0,
            base.discounted_arv
        ),
        format!(
            "- MAO ${:.0} | suggested cash offer ${:.0}",
            base.mao, base.suggested_cash_offer
        ),
        "Exit strategies:".to_string(),
    ];

    lines.extend(
        ExitStrategy::ordered()
            .into_iter()
            .map(|strategy| format!("  - {}: {}", strategy.label(), headline(strategy, result))),
    );
    lines
}

fn headline(strategy: ExitStrategy, result: &EvaluationResult) -> String {
    let exits = &result.exits;
    match strategy {
        ExitStrategy::Wholesale => format!(
            "assignment fee ${:.0}, seller nets ${:.0}{}",
            exits.wholesale.assignment_fee,
            exits.wholesale.net_to_seller,
            if exits.wholesale.offer_within_mao {
                ""
            } else {
                " (offer above MAO)"
            }
        ),
        ExitStrategy::Flip => format!(
            "profit ${:.0} after ${:.0} holding over {} months, ${:.0} capital",
            exits.flip.profit,
            exits.flip.holding_costs,
            exits.flip.holding_months,
            exits.flip.required_capital
        ),
        ExitStrategy::OwnerFinance | ExitStrategy::LandContract => {
            let exit = if strategy == ExitStrategy::OwnerFinance {
                &exits.owner_finance
            } else {
                &exits.land_contract
            };
            format!(
                "${:.0} down, ${:.0}/mo on ${:.0}, balloon ${:.0} after {} months",
                exit.down_payment,
                exit.monthly_payment,
                exit.amount_financed,
                exit.balloon_balance,
                exit.balloon_after_months
            )
        }
        ExitStrategy::LeaseOption => format!(
            "option fee ${:.0}, strike ${:.0}, ${:.0}/mo credit, ${:.0} due on exercise",
            exits.lease_option.option_fee,
            exits.lease_option.strike_price,
            exits.lease_option.monthly_credit,
            exits.lease_option.cash_needed_on_exercise
        ),
        ExitStrategy::SubjectTo => format!(
            "${:.0} upfront, ${:.0}/mo obligation, potential fee ${:.0}",
            exits.subject_to.upfront_cash,
            exits.subject_to.monthly_obligation,
            exits.subject_to.potential_wholesale_fee
        ),
    }
}
