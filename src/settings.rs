use {super::*, crate::config::Config, crate::wallet::HdOptions};

#[derive(Default, Debug)]
pub struct Settings {
  pub(crate) config: Config,
  pub(crate) options: Options,
}

impl Settings {
  const CONFIG_FILE: &'static str = "ecash-wallet.yaml";

  pub fn new(options: Options) -> Result<Self> {
    let config: Config = match &options.config {
      Some(path) => Self::load_config(path)?,
      None => match &options.config_dir {
        Some(dir) if dir.join(Self::CONFIG_FILE).exists() => {
          Self::load_config(&dir.join(Self::CONFIG_FILE))?
        }
        Some(_) | None => Default::default(),
      },
    };

    Ok(Self { config, options })
  }

  fn load_config(path: &Path) -> Result<Config> {
    serde_yaml::from_reader(
      File::open(path).with_context(|| format!("failed to open config `{}`", path.display()))?,
    )
    .with_context(|| format!("failed to parse config `{}`", path.display()))
  }

  pub fn account(&self) -> Result<u32> {
    Self::setting_typed(self.options.account, Some("ACCOUNT"), self.config.account, 0)
  }

  pub fn change_index(&self) -> Result<u32> {
    Self::setting_typed(
      self.options.change_index,
      Some("CHANGE_INDEX"),
      self.config.change_index,
      0,
    )
  }

  pub fn dust_sats(&self) -> Result<Amount> {
    Self::setting_typed(
      self.options.dust_sats,
      Some("DUST_SATS"),
      self.config.dust_sats,
      DEFAULT_DUST_SATS.to_sat(),
    )
    .map(Amount::from_sat)
  }

  pub fn fee_per_kb(&self) -> Result<FeeRate> {
    Self::setting_typed(
      self.options.fee_per_kb,
      Some("FEE_PER_KB"),
      self.config.fee_per_kb.map(FeeRate::from_sats_per_kb),
      FeeRate::DEFAULT,
    )
  }

  pub fn hd(&self) -> Result<bool> {
    Self::setting_typed(
      self.options.hd.then_some(true),
      Some("HD"),
      self.config.hd,
      false,
    )
  }

  pub fn receive_index(&self) -> Result<u32> {
    Self::setting_typed(
      self.options.receive_index,
      Some("RECEIVE_INDEX"),
      self.config.receive_index,
      0,
    )
  }

  pub fn snapshot(&self) -> Result<Option<PathBuf>> {
    if let Some(path) = &self.options.snapshot {
      return Ok(Some(path.clone()));
    }

    Ok(
      Self::setting(None, Some("SNAPSHOT"), None, None)?
        .map(PathBuf::from)
        .or_else(|| self.config.snapshot.clone()),
    )
  }

  /// The mnemonic is read from `--mnemonic-file` or `ECASH_WALLET_MNEMONIC`,
  /// never from the config file.
  pub fn mnemonic(&self) -> Result<String> {
    let from_file = match &self.options.mnemonic_file {
      Some(path) => Some(
        fs::read_to_string(path)
          .with_context(|| format!("failed to read mnemonic file `{}`", path.display()))?,
      ),
      None => None,
    };

    let mnemonic = Self::setting(from_file.as_deref(), Some("MNEMONIC"), None, None)?.ok_or_else(
      || anyhow!("no mnemonic: set ECASH_WALLET_MNEMONIC or pass --mnemonic-file"),
    )?;

    Ok(mnemonic.split_whitespace().collect::<Vec<&str>>().join(" "))
  }

  pub fn hd_options(&self) -> Result<HdOptions> {
    Ok(HdOptions {
      account: self.account()?,
      receive_index: self.receive_index()?,
      change_index: self.change_index()?,
    })
  }

  pub fn wallet(&self) -> Result<Wallet> {
    let mnemonic = self.mnemonic()?;

    let hd = if self.hd()? {
      Some(self.hd_options()?)
    } else {
      None
    };

    Wallet::from_mnemonic(&mnemonic, hd)
  }

  pub fn indexer(&self) -> Result<Snapshot> {
    match self.snapshot()? {
      Some(path) => Snapshot::load(&path),
      None => {
        log::warn!("no snapshot configured, wallet will see no UTXOs");
        Ok(Snapshot::default())
      }
    }
  }

  fn setting_typed<T>(
    arg_value: Option<T>,
    env_key: Option<&str>,
    config_value: Option<T>,
    default_value: T,
  ) -> Result<T>
  where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
  {
    if let Some(arg_value) = arg_value {
      return Ok(arg_value);
    }

    if let Some(env_key) = env_key {
      let key = format!("ECASH_WALLET_{env_key}");
      match env::var(key) {
        Ok(env_value) => {
          return env_value
            .parse()
            .with_context(|| anyhow!("failed to parse {env_key}"))
        }
        Err(err @ env::VarError::NotUnicode(_)) => return Err(err.into()),
        Err(env::VarError::NotPresent) => {}
      }
    }

    if let Some(config_value) = config_value {
      return Ok(config_value);
    }

    Ok(default_value)
  }

  fn setting(
    arg_value: Option<&str>,
    env_key: Option<&str>,
    config_value: Option<&str>,
    default_value: Option<&str>,
  ) -> Result<Option<String>> {
    if let Some(arg_value) = arg_value {
      return Ok(Some(arg_value.into()));
    }

    if let Some(env_key) = env_key {
      match env::var(format!("ECASH_WALLET_{env_key}")) {
        Ok(env_value) => return Ok(Some(env_value)),
        Err(err @ env::VarError::NotUnicode(_)) => return Err(err.into()),
        Err(env::VarError::NotPresent) => {}
      }
    }

    Ok(config_value.or(default_value).map(str::to_string))
  }
}

#[cfg(test)]
mod tests {
  use {super::*, pretty_assertions::assert_eq};

  fn settings(args: &[&str]) -> Settings {
    Settings::new(Options::try_parse_from(args).unwrap()).unwrap()
  }

  #[test]
  fn defaults() {
    let settings = settings(&["ecash-wallet"]);

    assert_eq!(settings.fee_per_kb().unwrap(), FeeRate::DEFAULT);
    assert_eq!(settings.dust_sats().unwrap(), DEFAULT_DUST_SATS);
    assert_eq!(settings.account().unwrap(), 0);
    assert!(!settings.hd().unwrap());
  }

  #[test]
  fn flags() {
    let settings = settings(&[
      "ecash-wallet",
      "--fee-per-kb",
      "2500",
      "--dust-sats",
      "1000",
      "--hd",
      "--account",
      "3",
      "--receive-index",
      "4",
    ]);

    assert_eq!(
      settings.fee_per_kb().unwrap(),
      FeeRate::from_sats_per_kb(2500)
    );
    assert_eq!(settings.dust_sats().unwrap(), Amount::from_sat(1000));
    assert!(settings.hd().unwrap());
    assert_eq!(
      settings.hd_options().unwrap(),
      HdOptions {
        account: 3,
        receive_index: 4,
        change_index: 0,
      }
    );
  }

  #[test]
  fn config_file_is_loaded() {
    let dir = tempfile::TempDir::new().unwrap();

    fs::write(
      dir.path().join("ecash-wallet.yaml"),
      "fee_per_kb: 3000\naccount: 1\n",
    )
    .unwrap();

    let settings = settings(&[
      "ecash-wallet",
      "--config-dir",
      dir.path().to_str().unwrap(),
    ]);

    assert_eq!(
      settings.fee_per_kb().unwrap(),
      FeeRate::from_sats_per_kb(3000)
    );
    assert_eq!(settings.account().unwrap(), 1);
  }

  #[test]
  fn flags_override_config() {
    let dir = tempfile::TempDir::new().unwrap();

    let path = dir.path().join("custom.yaml");

    fs::write(&path, "fee_per_kb: 3000\n").unwrap();

    let settings = settings(&[
      "ecash-wallet",
      "--config",
      path.to_str().unwrap(),
      "--fee-per-kb",
      "1500",
    ]);

    assert_eq!(
      settings.fee_per_kb().unwrap(),
      FeeRate::from_sats_per_kb(1500)
    );
  }

  #[test]
  fn missing_config_dir_file_is_ignored() {
    let dir = tempfile::TempDir::new().unwrap();

    let settings = settings(&[
      "ecash-wallet",
      "--config-dir",
      dir.path().to_str().unwrap(),
    ]);

    assert_eq!(settings.config, Config::default());
  }

  #[test]
  fn config_with_mnemonic_fails_to_load() {
    let dir = tempfile::TempDir::new().unwrap();

    let path = dir.path().join("ecash-wallet.yaml");

    fs::write(&path, format!("mnemonic: {MNEMONIC}\n")).unwrap();

    assert!(Settings::new(Options {
      config: Some(path),
      ..default()
    })
    .unwrap_err()
    .to_string()
    .starts_with("failed to parse config"));
  }

  #[test]
  fn mnemonic_from_file() {
    let dir = tempfile::TempDir::new().unwrap();

    let path = dir.path().join("mnemonic");

    fs::write(&path, format!("  {MNEMONIC}\n")).unwrap();

    let settings = Settings {
      options: Options {
        mnemonic_file: Some(path),
        ..default()
      },
      ..default()
    };

    assert_eq!(settings.mnemonic().unwrap(), MNEMONIC);

    assert_eq!(
      settings.wallet().unwrap().address(),
      Wallet::from_mnemonic(MNEMONIC, None).unwrap().address()
    );
  }

  #[test]
  fn hd_wallet_from_settings() {
    let dir = tempfile::TempDir::new().unwrap();

    let path = dir.path().join("mnemonic");

    fs::write(&path, MNEMONIC).unwrap();

    let settings = Settings {
      options: Options {
        mnemonic_file: Some(path),
        hd: true,
        account: Some(1),
        ..default()
      },
      ..default()
    };

    let wallet = settings.wallet().unwrap();

    assert!(wallet.is_hd());
    assert_eq!(wallet.account(), 1);
  }

  #[test]
  fn setting() {
    assert_eq!(Settings::setting(None, None, None, None).unwrap(), None);

    assert_eq!(
      Settings::setting(None, None, None, Some("foo")).unwrap(),
      Some("foo".into())
    );

    assert_eq!(
      Settings::setting(None, None, Some("bar"), Some("foo")).unwrap(),
      Some("bar".into())
    );

    assert_eq!(
      Settings::setting(Some("qux"), None, Some("bar"), Some("foo")).unwrap(),
      Some("qux".into())
    );
  }

  #[test]
  fn setting_typed() {
    assert_eq!(Settings::setting_typed(None, None, None, 7u32).unwrap(), 7);
    assert_eq!(
      Settings::setting_typed(None, None, Some(5u32), 7).unwrap(),
      5
    );
    assert_eq!(
      Settings::setting_typed(Some(1u32), None, Some(5), 7).unwrap(),
      1
    );
  }
}
