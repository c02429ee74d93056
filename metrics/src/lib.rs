use lazy_static::lazy_static;
use prometheus::{
    opts, Histogram, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
};

lazy_static! {
    // register_... 매크로는 기본 레지스트리에 자동으로 등록하므로,
    // 여기서는 Opts만 생성하고 서버 시작 시 수동으로 등록합니다.

    /// The current number of players waiting in the matchmaking queue.
    pub static ref PLAYERS_IN_QUEUE: IntGauge =
        IntGauge::with_opts(opts!("players_in_queue", "Current number of players in matchmaking queue")).unwrap();

    /// Active websocket connections.
    pub static ref ACTIVE_WS_CONNECTIONS: IntGauge =
        IntGauge::with_opts(opts!("active_ws_connections", "Number of active websocket connections")).unwrap();

    /// Battles whose actor is still running (including the linger period).
    pub static ref ACTIVE_BATTLES: IntGauge =
        IntGauge::with_opts(opts!("active_battles", "Number of battle rooms currently hosted")).unwrap();

    pub static ref MATCHES_CREATED_TOTAL: IntCounterVec =
        IntCounterVec::new(Opts::new("matches_created_total", "Total number of matches created"), &[
            "game_mode",
        ])
        .unwrap();

    /// Queue wait time from enqueue to MATCH_FOUND
    pub static ref MATCH_WAIT_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "match_wait_duration_seconds",
            "Time players spent waiting in queue until matched (seconds)",
        )
        .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 30.0, 45.0, 60.0, 90.0, 120.0]),
        &["game_mode"],
    )
    .unwrap();

    /// Rejected client requests, labelled by rejection code.
    pub static ref ACTIONS_REJECTED_TOTAL: IntCounterVec =
        IntCounterVec::new(
            Opts::new("actions_rejected_total", "Client requests rejected with ACTION_REJECTED"),
            &["reason"],
        )
        .unwrap();

    /// Abnormal behavior counter (unparseable frames are dropped, not answered)
    pub static ref MALFORMED_MESSAGES_TOTAL: IntCounterVec =
        IntCounterVec::new(
            Opts::new("malformed_messages_total", "Client frames dropped because they could not be parsed"),
            &["kind"],
        )
        .unwrap();

    pub static ref BATTLES_FINISHED_TOTAL: IntCounterVec =
        IntCounterVec::new(
            Opts::new("battles_finished_total", "Battles that reached an outcome, by end reason"),
            &["reason"],
        )
        .unwrap();

    pub static ref BATTLE_TICK_DURATION_SECONDS: Histogram =
        Histogram::with_opts(HistogramOpts::new(
            "battle_tick_duration_seconds",
            "Wall time spent processing one battle room tick (seconds)"
        ).buckets(vec![0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1])).unwrap();
}

/// Registers all custom metrics defined in this crate to the given registry.
///
/// This function should be called by the server during its startup phase
/// to ensure metrics are available for scraping.
pub fn register_custom_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(PLAYERS_IN_QUEUE.clone()))?;
    registry.register(Box::new(ACTIVE_WS_CONNECTIONS.clone()))?;
    registry.register(Box::new(ACTIVE_BATTLES.clone()))?;
    registry.register(Box::new(MATCHES_CREATED_TOTAL.clone()))?;
    registry.register(Box::new(MATCH_WAIT_DURATION_SECONDS.clone()))?;
    registry.register(Box::new(ACTIONS_REJECTED_TOTAL.clone()))?;
    registry.register(Box::new(MALFORMED_MESSAGES_TOTAL.clone()))?;
    registry.register(Box::new(BATTLES_FINISHED_TOTAL.clone()))?;
    registry.register(Box::new(BATTLE_TICK_DURATION_SECONDS.clone()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_every_collector_once() {
        let registry = Registry::new();
        register_custom_metrics(&registry).unwrap();

        MATCHES_CREATED_TOTAL.with_label_values(&["PVP"]).inc();
        let mut buffer = Vec::new();
        prometheus::Encoder::encode(&prometheus::TextEncoder::new(), &registry.gather(), &mut buffer)
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("matches_created_total{game_mode=\"PVP\"}"));
        assert!(text.contains("players_in_queue"));

        // 같은 레지스트리에 두 번 등록하면 실패해야 한다
        assert!(register_custom_metrics(&registry).is_err());
    }
}
