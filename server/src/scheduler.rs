//! Periodic deployment point grants

use crate::game::Game;
use log::{info, trace};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{interval, MissedTickBehavior};

/// Grants every team one deployment point each `period` until the game ends.
///
/// Runs as its own task. Each tick takes the game lock for the whole grant, so
/// a tick is never interleaved with a command.
pub async fn run_deployment_scheduler(game: Arc<Mutex<Game>>, period: Duration) {
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // The first tick completes immediately
    timer.tick().await;

    loop {
        timer.tick().await;

        let mut game = game.lock().await;
        if !game.is_live() {
            info!("Game is over, deployment scheduler stopping");
            break;
        }
        game.grant_deployment_points();
        trace!("Granted a deployment point to {} teams", game.teams().len());
    }
}
