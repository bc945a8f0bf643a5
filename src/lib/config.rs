use crate::logger::LogLevel;

/// A value that can appear as a field of a [`config!`] struct.
///
/// Config files only need to name the fields they want to change, so every
/// field is read through a partial representation and merged with its
/// default afterwards.
pub trait ConfigField: Sized {
    type Partial: serde::de::DeserializeOwned;

    fn from_partial_or(partial: Option<Self::Partial>, default: Self) -> Self;
}

macro_rules! plain_config_field {
    ($($t:ty),*) => {
        $(
            impl ConfigField for $t {
                type Partial = $t;

                fn from_partial_or(partial: Option<$t>, default: $t) -> $t {
                    partial.unwrap_or(default)
                }
            }
        )*
    };
}

plain_config_field!(bool, usize, u64, String, LogLevel);

impl<T: serde::de::DeserializeOwned> ConfigField for Option<T> {
    type Partial = T;

    fn from_partial_or(partial: Option<T>, default: Option<T>) -> Option<T> {
        partial.or(default)
    }
}

/// Declares a config struct together with a `Partial*` twin used for
/// deserialization, a [`Default`] implementation and `with_*`, `set_*` and
/// `get_*` accessors for every field.
macro_rules! config {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $field:ident : $ty:ty = $default:expr ),* $(,)?
        }
    ) => {
        paste::paste! {
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq, serde::Serialize)]
            pub struct $name {
                $( $field: $ty, )*
            }

            #[derive(Debug, Clone, Default, serde::Deserialize)]
            pub struct [<Partial $name>] {
                $(
                    #[serde(default)]
                    $field: Option<<$ty as ConfigField>::Partial>,
                )*
            }

            impl $name {
                pub fn from_partial(partial: [<Partial $name>]) -> Self {
                    Self {
                        $( $field: <$ty as ConfigField>::from_partial_or(partial.$field, $default), )*
                    }
                }

                pub fn from_toml(content: &str) -> anyhow::Result<Self> {
                    Ok(Self::from_partial(toml::from_str(content)?))
                }

                pub fn from_file<P: AsRef<std::path::Path>>(file_path: P) -> anyhow::Result<Self> {
                    let content = std::fs::read_to_string(file_path)?;
                    Self::from_toml(&content)
                }

                pub fn from_optional_file<P: AsRef<std::path::Path>>(
                    file_path: Option<P>,
                ) -> anyhow::Result<Self> {
                    match file_path {
                        Some(p) => Self::from_file(p),
                        None => Ok(Self::default()),
                    }
                }

                $(
                    pub fn [<with_ $field>](mut self, $field: $ty) -> Self {
                        self.$field = $field;
                        self
                    }

                    pub fn [<set_ $field>](&mut self, $field: $ty) {
                        self.$field = $field;
                    }

                    pub fn [<get_ $field>](&self) -> &$ty {
                        &self.$field
                    }
                )*
            }

            impl Default for $name {
                fn default() -> Self {
                    $name {
                        $( $field: $default, )*
                    }
                }
            }

            impl ConfigField for $name {
                type Partial = [<Partial $name>];

                fn from_partial_or(partial: Option<Self::Partial>, default: Self) -> Self {
                    match partial {
                        Some(p) => $name::from_partial(p),
                        None => default,
                    }
                }
            }
        }
    };
}

config! {
    pub struct LoggerConfig {
        enabled: bool = false,
        log_level: LogLevel = LogLevel::Warn,
    }
}

config! {
    /// Bounds for the searches that are not guaranteed to terminate on their
    /// own.
    pub struct SimulationConfig {
        max_configurations: usize = 100_000,
        max_stack_depth: usize = 10_000,
        max_turing_steps: usize = 1_000,
        logger: LoggerConfig = LoggerConfig::default(),
    }
}

#[test]
fn test_partial_config_falls_back_to_defaults() {
    let config = SimulationConfig::from_toml(
        r#"
        max_stack_depth = 12

        [logger]
        enabled = true
        "#,
    )
    .unwrap();

    assert_eq!(*config.get_max_stack_depth(), 12);
    assert_eq!(*config.get_max_configurations(), 100_000);
    assert!(*config.get_logger().get_enabled());
    assert_eq!(*config.get_logger().get_log_level(), LogLevel::Warn);
}

#[test]
fn test_config_builders() {
    let config = SimulationConfig::default().with_max_turing_steps(5);
    assert_eq!(*config.get_max_turing_steps(), 5);
    assert_eq!(
        SimulationConfig::from_optional_file(None::<&str>).unwrap(),
        SimulationConfig::default()
    );
}
