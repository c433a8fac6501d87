//! churn-dash: headless churn dashboard.
//!
//! Usage:
//!   churn-dash --page segments --sample-size 2000
//!   churn-dash --page predict --age 52 --geography Germany --active no
//!   churn-dash --ipc-mode --config dashboard.json

use anyhow::Result;
use churnwatch_core::{
    config::DashboardConfig,
    customer::CustomerRecord,
    engine::ChurnEngine,
    risk::RiskLabel,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Status,
    Overview,
    Explore,
    Performance,
    Segments {
        #[serde(default)]
        sample_size: Option<usize>,
    },
    Predict {
        input: CustomerRecord,
    },
    Insights,
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut config = match flag_value(&args, "--config") {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    };
    if let Some(path) = flag_value(&args, "--dataset") {
        config.dataset_path = path.to_string();
    }
    if let Some(path) = flag_value(&args, "--model") {
        config.model_path = path.to_string();
    }
    config.seed = parse_arg(&args, "--seed", config.seed);
    config.sample_size = parse_arg(&args, "--sample-size", config.sample_size);

    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let page = flag_value(&args, "--page").unwrap_or("home");

    let engine = ChurnEngine::load(config);

    if ipc_mode {
        run_ipc_loop(&engine)?;
    } else {
        render_page(&engine, page, &args)?;
    }

    Ok(())
}

fn run_ipc_loop(engine: &ChurnEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        if matches!(cmd, IpcCommand::Quit) {
            break;
        }

        let response = match handle_command(engine, cmd) {
            Ok(v) => v,
            Err(e) => serde_json::json!({ "error": e.to_string() }),
        };
        writeln!(stdout, "{}", response)?;
        stdout.flush()?;
    }
    Ok(())
}

fn handle_command(engine: &ChurnEngine, cmd: IpcCommand) -> Result<serde_json::Value> {
    let value = match cmd {
        IpcCommand::Status                     => serde_json::to_value(engine.status())?,
        IpcCommand::Overview                   => serde_json::to_value(engine.overview()?)?,
        IpcCommand::Explore                    => serde_json::to_value(engine.exploration()?)?,
        IpcCommand::Performance                => serde_json::to_value(engine.performance()?)?,
        IpcCommand::Segments { sample_size }   => serde_json::to_value(engine.segmentation(sample_size)?)?,
        IpcCommand::Predict { input }          => serde_json::to_value(engine.predict(&input)?)?,
        IpcCommand::Insights                   => serde_json::to_value(engine.insights()?)?,
        IpcCommand::Quit                       => serde_json::Value::Null,
    };
    Ok(value)
}

fn render_page(engine: &ChurnEngine, page: &str, args: &[String]) -> Result<()> {
    let status = engine.status();
    if !status.dataset_loaded {
        println!("! Dataset not found at {}; data views are disabled.", engine.config.dataset_path);
    }
    if !status.model_loaded {
        println!("! Model not found at {}; prediction views are disabled.", engine.config.model_path);
    }

    match page {
        "home"        => print_home(engine),
        "explore"     => print_exploration(engine),
        "performance" => print_performance(engine),
        "segments"    => print_segments(engine),
        "predict"     => print_prediction(engine, &record_from_args(args)),
        "insights"    => print_insights(engine),
        other => {
            log::warn!("Unknown page: {}", other);
            println!("Unknown page '{other}'. Pages: home, explore, performance, segments, predict, insights");
            Ok(())
        }
    }
}

fn print_home(engine: &ChurnEngine) -> Result<()> {
    println!("=== CUSTOMER CHURN DASHBOARD ===");
    let Ok(o) = engine.overview() else {
        return Ok(());
    };
    println!("  total customers:    {}", o.total);
    println!("  churn rate:         {:.2}%", o.churn_rate);
    println!("  churned customers:  {}", o.churned);
    println!("  retained customers: {}", o.retained);

    if let Ok(model) = engine.model() {
        if let Some(best) = model.card().best() {
            println!();
            println!("=== MODEL ===");
            println!("  best model: {}", best.model);
            println!("  AUC:        {:.3}", best.auc);
            println!("  accuracy:   {:.1}%", best.accuracy * 100.0);
        }
    }
    Ok(())
}

fn print_exploration(engine: &ChurnEngine) -> Result<()> {
    let Ok(x) = engine.exploration() else {
        return Ok(());
    };
    println!("=== DATASET STATISTICS ===");
    println!("  {:<16} {:>7} {:>12} {:>12} {:>12} {:>12}", "column", "count", "mean", "std", "min", "max");
    for s in &x.statistics {
        println!(
            "  {:<16} {:>7} {:>12.2} {:>12.2} {:>12.2} {:>12.2}",
            s.column, s.count, s.mean, s.std, s.min, s.max
        );
    }

    for (title, groups) in [
        ("GEOGRAPHY", &x.by_geography),
        ("GENDER", &x.by_gender),
        ("NUMBER OF PRODUCTS", &x.by_products),
    ] {
        println!();
        println!("=== CHURN RATE BY {title} ===");
        for g in groups {
            println!("  {:<10} {:>6} customers  {:>6.2}%", g.group, g.count, g.churn_rate);
        }
    }
    Ok(())
}

fn print_performance(engine: &ChurnEngine) -> Result<()> {
    let p = match engine.performance() {
        Ok(p) => p,
        Err(e) => {
            println!("  {e}");
            return Ok(());
        }
    };

    println!("=== MODEL COMPARISON ===");
    for m in &p.card.comparison {
        println!(
            "  {:<20} AUC {:.3} | Acc {:.3} | Prec {:.3} | Rec {:.3} | F1 {:.3}",
            m.model, m.auc, m.accuracy, m.precision, m.recall, m.f1
        );
    }

    println!();
    println!("=== TOP CHURN DRIVERS ===");
    for f in p.card.top_drivers(10) {
        println!("  {:<20} {:.3}", f.feature, f.importance);
    }

    if let Some(e) = p.evaluation {
        println!();
        println!("=== LIVE EVALUATION ({}) ===", e.model);
        let c = e.confusion;
        println!("  TN {} | FP {} | FN {} | TP {}", c.true_negative, c.false_positive, c.false_negative, c.true_positive);
        println!("  accuracy {:.3} | precision {:.3} | recall {:.3} | F1 {:.3}", e.accuracy, e.precision, e.recall, e.f1);
        match e.auc {
            Some(auc) => println!("  ROC AUC  {auc:.3}"),
            None      => println!("  ROC AUC  n/a (single class)"),
        }
    }
    Ok(())
}

fn print_segments(engine: &ChurnEngine) -> Result<()> {
    let report = match engine.segmentation(None) {
        Ok(r) => r,
        Err(e) => {
            println!("  {e}");
            return Ok(());
        }
    };

    println!("=== RISK SEGMENTS (seed {}, {} customers) ===", report.seed, report.sample_size);
    for s in &report.segments {
        let actual = s
            .actual_churn_rate
            .map(|r| format!("{r:.1}%"))
            .unwrap_or_else(|| "n/a".into());
        println!(
            "  {:<12} {:>6} ({:>5.1}%)  actual churn {}",
            s.label.display_name(),
            s.count,
            s.share,
            actual
        );
    }

    if let Some(h) = &report.high_risk {
        println!();
        println!("=== HIGH-RISK PROFILE ===");
        println!("  average age:          {:.1} years", h.avg_age);
        println!("  average balance:      ${:.0}", h.avg_balance);
        println!("  average credit score: {:.0}", h.avg_credit_score);
        println!("  actual churn rate:    {:.1}%", h.actual_churn_rate);

        println!();
        println!("=== HIGH-RISK CUSTOMERS (sample) ===");
        for row in &report.high_risk_customers {
            println!(
                "  {:>10} age {:>3} {:<8} ${:>12.2} products {} active {:<5} p={:>5.1}% exited {}",
                row.customer_id,
                row.age,
                row.geography,
                row.balance,
                row.num_products,
                row.is_active_member,
                row.churn_probability * 100.0,
                row.exited,
            );
        }
    } else {
        println!("  no {} customers in this sample", RiskLabel::High.display_name());
    }
    Ok(())
}

fn print_prediction(engine: &ChurnEngine, record: &CustomerRecord) -> Result<()> {
    let p = match engine.predict(record) {
        Ok(p) => p,
        Err(e) => {
            println!("Error making prediction: {e}");
            return Ok(());
        }
    };

    println!("=== PREDICTION ===");
    println!("  churn probability: {:.1}%", p.assessment.probability * 100.0);
    println!("  prediction:        {}", p.assessment.prediction.display_name());
    println!("  risk level:        {}", p.assessment.label.display_name());
    println!("  engagement score:  {:.2}", p.engagement_score);
    println!("  CLV proxy:         {:.2}", p.clv_proxy);
    println!();
    println!("=== {} ===", p.headline);
    for action in p.actions {
        println!("  - {action}");
    }
    Ok(())
}

fn print_insights(engine: &ChurnEngine) -> Result<()> {
    let i = match engine.insights() {
        Ok(i) => i,
        Err(e) => {
            println!("  {e}");
            return Ok(());
        }
    };

    println!("=== FINANCIAL IMPACT ===");
    println!("  total customers: {}", i.overview.total);
    println!("  annual churn:    {} customers", i.overview.churned);
    println!("  revenue at risk: ${:.0}", i.revenue_at_risk);
    println!();
    println!("=== INTERVENTION SCENARIOS ===");
    for s in &i.scenarios {
        println!(
            "  {:>4.0}% | retained {:>5} | preserved ${:>12.0} | cost ${:>9.0} | net ${:>12.0} | ROI {}",
            s.retention_rate * 100.0,
            s.customers_retained,
            s.revenue_preserved,
            s.intervention_cost,
            s.net_benefit,
            format_roi(s.roi_percent),
        );
    }

    if let Some(f) = &i.high_risk_focus {
        println!();
        println!("=== HIGH-RISK SEGMENT FOCUS ({} customers) ===", f.customers);
        println!("  expected churners: {}", f.expected_churners);
        println!("  customers saved:   {}", f.customers_saved);
        println!("  revenue preserved: ${:.0}", f.revenue_preserved);
        println!("  intervention cost: ${:.0}", f.intervention_cost);
        println!("  net benefit:       ${:.0}", f.net_benefit);
        println!("  ROI:               {}", format_roi(f.roi_percent));
    }
    Ok(())
}

fn format_roi(roi: Option<f64>) -> String {
    roi.map(|r| format!("{r:.0}%")).unwrap_or_else(|| "n/a".into())
}

/// What-if record from CLI flags, with the dashboard's form defaults.
fn record_from_args(args: &[String]) -> CustomerRecord {
    CustomerRecord {
        credit_score:     parse_arg(args, "--credit-score", 650),
        age:              parse_arg(args, "--age", 35),
        tenure:           parse_arg(args, "--tenure", 5),
        balance:          parse_arg(args, "--balance", 75_000.0),
        num_products:     parse_arg(args, "--products", 1),
        has_credit_card:  yes_no(args, "--has-card", true),
        is_active_member: yes_no(args, "--active", true),
        estimated_salary: parse_arg(args, "--salary", 100_000.0),
        geography:        flag_value(args, "--geography").unwrap_or("France").to_string(),
        gender:           flag_value(args, "--gender").unwrap_or("Male").to_string(),
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn yes_no(args: &[String], flag: &str, default: bool) -> bool {
    match flag_value(args, flag) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "yes" | "y" | "true" | "1"),
        None => default,
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
