use std::{env, str::FromStr, time::Duration};

use super::env::{
    AppConfig, ConfigError, DirectoryConfig, JobConfig, LogRotation, LoggingConfig,
    PipelineConfig, SchedulerConfig, SummarizerConfig, TelegramConfig, WebContentConfig,
};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let telegram = TelegramConfig {
            bot_token: non_empty("TELEGRAM_BOT_TOKEN"),
            chat_id: parse_opt("TELEGRAM_CHAT_ID")?,
        };

        let summarizer = SummarizerConfig {
            api_url: env::var("SUMMARIZER_API_URL")
                .unwrap_or_else(|_| "http://localhost:1234/v1/chat/completions".to_string()),
            api_key: non_empty("SUMMARIZER_API_KEY"),
            model: env::var("SUMMARIZER_MODEL").unwrap_or_else(|_| "llama 3.2 8b".to_string()),
            temperature: parse_opt("SUMMARIZER_TEMPERATURE")?.unwrap_or(0.7),
        };

        let defaults = PipelineConfig::default();
        let pipeline = PipelineConfig {
            article_limit: parse_opt("ARTICLE_LIMIT")?.unwrap_or(defaults.article_limit),
            token_limit: parse_opt("TOKEN_LIMIT")?.unwrap_or(defaults.token_limit),
            max_message_length: parse_opt("MAX_MESSAGE_LENGTH")?
                .unwrap_or(defaults.max_message_length),
        };
        if pipeline.max_message_length == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_MESSAGE_LENGTH",
                value: "0".to_string(),
            });
        }

        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            bookmarks_filename: env::var("BOOKMARKS_FILENAME")
                .unwrap_or_else(|_| "bookmarks.txt".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            rotation: parse_opt::<LogRotation>("LOG_ROTATION")?.unwrap_or_default(),
            max_files: parse_opt("LOG_MAX_FILES")?,
        };

        let timezone = env::var("BOT_TIMEZONE").unwrap_or_else(|_| "UTC".to_string());

        let scheduler = SchedulerConfig {
            cron_specs: env::var("RUN_CRONS")
                .map(|value| split_specs(&value))
                .unwrap_or_else(|_| vec!["0 0 8 * * *".to_string()]),
        };

        let web = WebContentConfig {
            fetch_timeout: Duration::from_millis(
                parse_opt("WEBPAGE_FETCH_TIMEOUT")?.unwrap_or(30_000),
            ),
            user_agent: env::var("WEBPAGE_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
        };

        let jobs = JobConfig {
            pdf_summary_command: non_empty("PDF_SUMMARY_COMMAND"),
        };

        Ok(Self {
            telegram,
            summarizer,
            pipeline,
            directories,
            logging,
            timezone,
            scheduler,
            web,
            jobs,
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_opt<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match non_empty(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn split_specs(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cron_specs_split_on_semicolons() {
        let specs = split_specs("0 0 8 * * *; ;0 30 20 * * *;");
        assert_eq!(specs, vec!["0 0 8 * * *", "0 30 20 * * *"]);
    }

    #[test]
    fn pipeline_defaults_match_reference_channel() {
        let defaults = PipelineConfig::default();
        assert_eq!(defaults.article_limit, 1);
        assert_eq!(defaults.token_limit, 60_000);
        assert_eq!(defaults.max_message_length, 4096);
    }

    #[test]
    fn log_rotation_parses_case_insensitively() {
        assert_eq!("Hourly".parse::<LogRotation>().unwrap(), LogRotation::Hourly);
        assert_eq!(" never ".parse::<LogRotation>().unwrap(), LogRotation::Never);
        assert_eq!(LogRotation::default(), LogRotation::Daily);
        assert!(matches!(
            "weekly".parse::<LogRotation>(),
            Err(ConfigError::Invalid { key: "LOG_ROTATION", .. })
        ));
    }
}
