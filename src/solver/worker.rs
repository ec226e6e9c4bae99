use std::sync::mpsc::{Receiver, Sender, TryRecvError};

use tracing::{debug, info, trace};

use crate::config::SolverConfig;
use crate::game::{BoardState, COLS, ROWS};

use super::protocol::{is_decided, ScoreMap, SolverMessage, SolverRequest};
use super::search::{Halt, Search};

/// Analysis of the worker's current position.
struct Analysis {
    position: BoardState,
    /// Last fully searched depth and its scores.
    depth: u32,
    scores: ScoreMap,
    nodes_spent: u64,
    ready: bool,
}

impl Analysis {
    fn new(position: BoardState) -> Self {
        let ready = position.is_over();
        Analysis {
            position,
            depth: 0,
            scores: ScoreMap::new(),
            nodes_spent: 0,
            ready,
        }
    }

    fn ply(&self) -> u32 {
        self.position.move_count()
    }
}

/// What one round of deepening produced.
enum Deepened {
    Finished,
    Interrupted(SolverRequest),
    Disconnected,
}

/// Background solver loop. Deepens the analysis of its position between
/// requests and blocks once it is ready. Returns when either channel closes.
pub fn run_worker<T>(config: SolverConfig, requests: Receiver<SolverRequest>, replies: Sender<T>)
where
    T: From<SolverMessage>,
{
    let send = |message: SolverMessage| replies.send(T::from(message)).is_ok();
    let mut analysis = Analysis::new(BoardState::new());
    let mut pending: Option<SolverRequest> = None;

    info!(max_depth = config.max_depth, node_budget = config.node_budget, "solver worker started");

    loop {
        let request = match pending.take() {
            Some(request) => Some(request),
            None => match requests.try_recv() {
                Ok(request) => Some(request),
                Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) if analysis.ready => {
                    // Nothing left to refine: wait for the next request.
                    match requests.recv() {
                        Ok(request) => Some(request),
                        Err(_) => break,
                    }
                }
                Err(TryRecvError::Empty) => None,
            },
        };

        if let Some(request) = request {
            debug!(?request, "solver request received");
            if !handle_request(request, &mut analysis, &send) {
                break;
            }
            continue;
        }

        match deepen(&config, &mut analysis, &requests, &send) {
            Deepened::Finished => {}
            Deepened::Interrupted(request) => pending = Some(request),
            Deepened::Disconnected => break,
        }
    }

    info!("solver worker stopped");
}

/// Apply one request. Returns false once the reply channel is gone.
fn handle_request(
    request: SolverRequest,
    analysis: &mut Analysis,
    send: &impl Fn(SolverMessage) -> bool,
) -> bool {
    match request {
        SolverRequest::NewGame => {
            *analysis = Analysis::new(BoardState::new());
            true
        }
        SolverRequest::MakeMove { ply, column } => {
            let mut next = analysis.position;
            let accepted = ply == analysis.ply() + 1 && next.apply_move(column).is_ok();
            if accepted {
                *analysis = Analysis::new(next);
            } else {
                debug!(ply, column, current = analysis.ply(), "rejecting move");
            }
            let reply = SolverMessage::MoveReply {
                ply,
                column,
                accepted,
                status: analysis.position.status(),
            };
            send(reply)
                && (!accepted
                    || send(SolverMessage::ReadinessUpdate {
                        ply,
                        ready: analysis.ready,
                    }))
        }
        SolverRequest::RequestUpdate { ply } => resend(analysis, ply, send),
    }
}

/// Answer `RequestUpdate` with the last finished depth, if there is one for
/// `ply`. Returns false once the reply channel is gone.
fn resend(analysis: &Analysis, ply: u32, send: &impl Fn(SolverMessage) -> bool) -> bool {
    if ply != analysis.ply() || analysis.scores.is_empty() {
        return true;
    }
    send(SolverMessage::EvaluationUpdate {
        ply,
        scores: analysis.scores.clone(),
        depth: analysis.depth,
    })
}

/// Search one ply deeper than the last finished depth.
fn deepen(
    config: &SolverConfig,
    analysis: &mut Analysis,
    requests: &Receiver<SolverRequest>,
    send: &impl Fn(SolverMessage) -> bool,
) -> Deepened {
    let depth = analysis.depth + 1;
    // Depth 1 always runs to completion, so a ready position has scores.
    let remaining = if analysis.scores.is_empty() {
        u64::MAX
    } else {
        config.node_budget.saturating_sub(analysis.nodes_spent)
    };

    let mut interruption: Option<Deepened> = None;
    let (result, nodes) = {
        let current: &Analysis = analysis;
        let mut poll = || match requests.try_recv() {
            // Answered from the last finished depth; the search goes on.
            Ok(SolverRequest::RequestUpdate { ply }) => {
                if resend(current, ply, send) {
                    false
                } else {
                    interruption = Some(Deepened::Disconnected);
                    true
                }
            }
            Ok(request) => {
                interruption = Some(Deepened::Interrupted(request));
                true
            }
            Err(TryRecvError::Disconnected) => {
                interruption = Some(Deepened::Disconnected);
                true
            }
            Err(TryRecvError::Empty) => false,
        };
        let mut search = Search::new(remaining, config.interrupt_check_nodes, &mut poll);
        let result = search.score_moves(&current.position, depth);
        (result, search.nodes())
    };
    analysis.nodes_spent += nodes;

    let ply = analysis.ply();
    match result {
        Ok(scores) => {
            trace!(ply, depth, nodes, "depth finished");
            let decided = scores.values().all(|&score| is_decided(score));
            analysis.depth = depth;
            analysis.scores = scores;

            let delivered = send(SolverMessage::EvaluationUpdate {
                ply,
                scores: analysis.scores.clone(),
                depth,
            });
            if !delivered {
                return Deepened::Disconnected;
            }

            let exhausted = depth >= config.max_depth
                || decided
                || depth as usize + ply as usize >= ROWS * COLS;
            if exhausted && !mark_ready(analysis, send) {
                return Deepened::Disconnected;
            }
            Deepened::Finished
        }
        Err(Halt::BudgetExhausted) => {
            debug!(ply, depth, spent = analysis.nodes_spent, "node budget exhausted");
            if mark_ready(analysis, send) {
                Deepened::Finished
            } else {
                Deepened::Disconnected
            }
        }
        Err(Halt::Interrupted) => {
            trace!(ply, depth, "depth abandoned");
            interruption.unwrap_or(Deepened::Disconnected)
        }
    }
}

fn mark_ready(analysis: &mut Analysis, send: &impl Fn(SolverMessage) -> bool) -> bool {
    analysis.ready = true;
    send(SolverMessage::ReadinessUpdate {
        ply: analysis.ply(),
        ready: true,
    })
}
