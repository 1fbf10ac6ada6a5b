//! When steps for daily automation BDD scenarios.

use super::world::{AutomationWorld, run_async};
use rstest_bdd_macros::when;
use tasker::task::services::AutomationContext;

fn run(world: &mut AutomationWorld) -> Result<(), eyre::Report> {
    let context = AutomationContext::new(world.user_id()?, world.active_group.clone());
    let result = run_async(world.automation.run_daily_automation(&context));
    world.last_outcome = Some(result);
    Ok(())
}

#[when("daily automation runs")]
fn automation_runs(world: &mut AutomationWorld) -> Result<(), eyre::Report> {
    run(world)
}

#[when("daily automation runs again")]
fn automation_runs_again(world: &mut AutomationWorld) -> Result<(), eyre::Report> {
    run(world)
}
