use std::collections::HashMap;

use crate::config::RuntimeConfig;

/// What an inbound topic feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Holiday,
    Override,
    Mode,
    Schedule,
}

/// Exact-match lookup from subscribed topic to its [`Route`], built once from
/// the config.
#[derive(Debug, Clone)]
pub struct TopicRouter {
    routes: HashMap<String, Route>,
}

impl TopicRouter {
    pub fn from_config(config: &RuntimeConfig) -> Self {
        let mut routes = HashMap::new();
        routes.insert(
            config.sensors.holiday.address().to_string(),
            Route::Holiday,
        );
        routes.insert(
            config.sensors.override_point.address().to_string(),
            Route::Override,
        );
        routes.insert(config.schedule_topic.clone(), Route::Schedule);
        if let Some(mode_topic) = &config.mode_topic {
            routes.insert(mode_topic.clone(), Route::Mode);
        }
        Self { routes }
    }

    pub fn route(&self, topic: &str) -> Option<Route> {
        self.routes.get(topic).copied()
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }
}
