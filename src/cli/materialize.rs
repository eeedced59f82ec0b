use colored::Colorize;

use crate::cli::{open_db, parse_date_opt};
use crate::error::Result;
use crate::materializer::materialize;

pub fn run(date: Option<&str>) -> Result<()> {
    let date = parse_date_opt(date)?.unwrap_or_else(|| crate::schedule::today());
    let mut conn = open_db()?;
    let report = materialize(&mut conn, date)?;

    println!("Materialized recurring items for {date}");
    println!("  Templates:      {}", report.considered);
    println!("  Created:        {}", report.created.to_string().green());
    println!("  Already there:  {}", report.already_materialized);
    println!("  Not due:        {}", report.not_due);
    println!("  Out of period:  {}", report.out_of_period);
    if report.duration_reached > 0 {
        println!("  Limit reached:  {}", report.duration_reached.to_string().yellow());
    }
    Ok(())
}
