//! Headless command loop: a blocking synchronous loop that reads JSON
//! commands from stdin and writes JSON responses to stdout.
//!
//! ## Protocol
//!
//! Each line of stdin is a JSON object with a `"cmd"` discriminator.
//! Each line of stdout is a JSON response with `"protocol_version"` and
//! `"type"` fields. See [`smart_transit::protocol`] for the full schema.
//! Logs go to stderr so they never interleave with responses.

use std::io::{BufRead, Write};

use bevy::prelude::*;

use smart_transit::busy_stop_alerts::AlertChannel;
use smart_transit::commands;
use smart_transit::driver::ControllerSchedule;
use smart_transit::notifications::{NotificationEvent, NotificationLog};
use smart_transit::protocol::{
    make_response, ResponsePayload, TransitCommand, TransitResponse, PROTOCOL_VERSION,
};
use smart_transit::settings::TransitSettings;
use smart_transit::{SmartTransitPlugin, TickCounter, TransitError};

/// Upper bound for a single `step` command.
const MAX_STEP_TICKS: u64 = 10_000;

/// Add the controller and save plugins, with `settings` in place before the
/// controller sees its first tick.
pub(crate) fn install(app: &mut App, settings: TransitSettings) {
    app.insert_resource(settings)
        .add_plugins((SmartTransitPlugin, save::SavePlugin));
}

pub(crate) fn run_command_loop(app: &mut App) {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    if let Err(e) = serve(app, stdin.lock(), stdout.lock()) {
        error!("stdout write error: {e}");
    }
    info!("transit_manager shutting down");
}

/// Answer every command line from `input` on `output` until `quit` or EOF.
fn serve(app: &mut App, input: impl BufRead, mut output: impl Write) -> std::io::Result<()> {
    write_response(&mut output, &make_response(ResponsePayload::Ready))?;
    info!("transit_manager protocol v{PROTOCOL_VERSION} ready, waiting for commands on stdin");

    for line in input.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                error!("stdin read error: {e}");
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let cmd: TransitCommand = match serde_json::from_str(&line) {
            Ok(c) => c,
            Err(e) => {
                warn!("rejected command line: {e}");
                let resp = make_response(ResponsePayload::Error {
                    message: format!("Parse error: {e}"),
                });
                write_response(&mut output, &resp)?;
                continue;
            }
        };

        let response = process_command(cmd, app);
        let is_goodbye = matches!(response.payload, ResponsePayload::Goodbye);
        write_response(&mut output, &response)?;

        if is_goodbye {
            break;
        }
    }
    Ok(())
}

fn write_response(output: &mut impl Write, response: &TransitResponse) -> std::io::Result<()> {
    match serde_json::to_string(response) {
        Ok(line) => writeln!(output, "{line}")?,
        Err(e) => error!("failed to encode response: {e}"),
    }
    output.flush()
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

fn respond<T>(
    result: Result<T, TransitError>,
    on_ok: impl FnOnce(T) -> ResponsePayload,
) -> ResponsePayload {
    result.map_or_else(ResponsePayload::from, on_ok)
}

fn process_command(cmd: TransitCommand, app: &mut App) -> TransitResponse {
    let world = app.world_mut();

    let payload = match cmd {
        TransitCommand::AddRule => ResponsePayload::RuleAdded {
            rule_id: commands::add_rule(world),
        },

        TransitCommand::SetRule { rule_id, params } => {
            commands::set_rule(world, rule_id, &params);
            respond(commands::get_rule(world, rule_id), |rule| {
                ResponsePayload::Rule { rule }
            })
        }

        TransitCommand::GetRule { rule_id } => {
            respond(commands::get_rule(world, rule_id), |rule| {
                ResponsePayload::Rule { rule }
            })
        }

        TransitCommand::ListRules => ResponsePayload::Rules {
            rules: commands::list_rules(world),
        },

        TransitCommand::RemoveRule { rule_id } => {
            respond(commands::remove_custom_rule(world, rule_id), |()| {
                ResponsePayload::Ok
            })
        }

        TransitCommand::BindRoute { route, rule_id } => {
            respond(commands::bind_route_to_rule(world, route, rule_id), |()| {
                ResponsePayload::RouteBound { route }
            })
        }

        TransitCommand::EffectiveRule { route } => ResponsePayload::EffectiveRule {
            effective: commands::effective_rule(world, route),
        },

        TransitCommand::ApplicableRules { transport_type } => ResponsePayload::RuleChoices {
            choices: commands::applicable_rules(world, transport_type),
        },

        TransitCommand::ListRoutes => ResponsePayload::Routes {
            routes: commands::list_routes(world),
        },

        TransitCommand::RouteSnapshot { route } => {
            respond(commands::route_snapshot(world, route), |snapshot| {
                ResponsePayload::Snapshot { snapshot }
            })
        }

        TransitCommand::UpsertRoute { route } => {
            commands::upsert_route(world, route);
            ResponsePayload::Ok
        }

        TransitCommand::RemoveRoute { route } => {
            respond(commands::remove_route(world, route), |()| ResponsePayload::Ok)
        }

        TransitCommand::RegisterModel { model_id, model } => {
            commands::register_vehicle_model(world, model_id, model);
            ResponsePayload::Ok
        }

        TransitCommand::UpdateSettings { mut settings } => {
            settings.sanitize();
            world.insert_resource(settings);
            ResponsePayload::Ok
        }

        TransitCommand::SetAlertsAvailable { available } => {
            world.resource_mut::<AlertChannel>().available = available;
            ResponsePayload::Ok
        }

        TransitCommand::SetRouteRulePayload { payload } => {
            respond(commands::set_route_rule_from_payload(world, &payload), |route| {
                ResponsePayload::RouteBound { route }
            })
        }

        TransitCommand::AddCustomRulePayload { payload } => {
            respond(commands::add_custom_rule_from_payload(world, &payload), |rule_id| {
                ResponsePayload::RuleAdded { rule_id }
            })
        }

        TransitCommand::Tick => ResponsePayload::PassComplete {
            report: commands::tick(world),
        },

        TransitCommand::Step { ticks } => step(world, ticks),

        TransitCommand::Notifications => ResponsePayload::Notifications {
            notifications: world.resource::<NotificationLog>().journal.clone(),
        },

        TransitCommand::Save { path } => match save::save_to_path(world, &path) {
            Ok(_) => ResponsePayload::Ok,
            Err(e) => {
                warn!("save to {path} failed: {e}");
                ResponsePayload::Error {
                    message: format!("Save failed: {e}"),
                }
            }
        },

        TransitCommand::Load { path } => match save::load_from_path(world, &path) {
            Ok(_) => ResponsePayload::Ok,
            Err(e) => {
                warn!("load from {path} failed: {e}");
                ResponsePayload::Error {
                    message: format!("Load failed: {e}"),
                }
            }
        },

        TransitCommand::Quit => ResponsePayload::Goodbye,
    };

    make_response(payload)
}

/// Run `FixedUpdate` once per tick, counting controller passes.
fn step(world: &mut World, ticks: u64) -> ResponsePayload {
    let mut passes = 0;
    for _ in 0..ticks.min(MAX_STEP_TICKS) {
        world.run_schedule(FixedUpdate);
        if world.resource::<ControllerSchedule>().should_run() {
            passes += 1;
        }
        // Nothing else advances the event buffers between manual ticks.
        world.resource_mut::<Events<NotificationEvent>>().update();
    }
    ResponsePayload::StepComplete {
        tick: world.resource::<TickCounter>().0,
        passes,
    }
}
