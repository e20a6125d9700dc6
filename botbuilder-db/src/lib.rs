pub mod levels;
pub mod tickets;

use std::{fmt::Debug, path::Path};

use botbuilder_traits::ForwardRefToTracing;
use color_eyre::eyre::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use sled::{Db, Tree};

pub trait ReadWriteTree {
    fn typed_insert<K: DeserializeOwned + Serialize, V: DeserializeOwned + Serialize>(
        &self,
        key: &K,
        value: &V,
    ) -> Result<()>;

    fn typed_get<K: DeserializeOwned + Serialize, V: DeserializeOwned + Serialize>(
        &self,
        key: &K,
    ) -> Result<Option<V>>;

    fn typed_get_or_default<
        K: DeserializeOwned + Serialize,
        V: DeserializeOwned + Serialize + Default,
    >(
        &self,
        key: &K,
    ) -> Result<V> {
        Ok(self.typed_get::<K, V>(key)?.unwrap_or_default())
    }

    fn typed_merge<K: DeserializeOwned + Serialize, V: DeserializeOwned + Serialize>(
        &self,
        key: &K,
        value: &V,
    ) -> Result<Option<Vec<u8>>>;

    fn typed_values<V: DeserializeOwned + Serialize>(&self) -> Result<Vec<V>>;
}

impl ReadWriteTree for Tree {
    fn typed_insert<K: DeserializeOwned + Serialize, V: DeserializeOwned + Serialize>(
        &self,
        key: &K,
        value: &V,
    ) -> Result<()> {
        let key = bincode::serialize::<K>(key)?;
        let value = bincode::serialize::<V>(value)?;
        self.insert(key, value)?;
        Ok(())
    }

    fn typed_get<K: DeserializeOwned + Serialize, V: DeserializeOwned + Serialize>(
        &self,
        key: &K,
    ) -> Result<Option<V>> {
        Ok(self
            .get(bincode::serialize::<K>(key)?)?
            .map(|value| bincode::deserialize::<V>(&value))
            .transpose()?)
    }

    /// Returns the raw previous value, the merge operator decides the new one.
    fn typed_merge<K: DeserializeOwned + Serialize, V: DeserializeOwned + Serialize>(
        &self,
        key: &K,
        value: &V,
    ) -> Result<Option<Vec<u8>>> {
        Ok(self
            .merge(
                bincode::serialize::<K>(key)?,
                bincode::serialize::<V>(value)?,
            )?
            .map(|value| value.to_vec()))
    }

    fn typed_values<V: DeserializeOwned + Serialize>(&self) -> Result<Vec<V>> {
        self.iter()
            .values()
            .map(|value| -> Result<V> { Ok(bincode::deserialize::<V>(&value?)?) })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct BotDb(Db);

impl BotDb {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        sled::open(path)
            .map(Self)
            .wrap_err_with(|| format!("Failed to open database at {}", path.display()))
    }

    /// A throwaway database, deleted when dropped.
    pub fn temporary() -> Result<Self> {
        Ok(Self(sled::Config::new().temporary(true).open()?))
    }

    pub fn generate_id(&self) -> Result<u64> {
        self.0.generate_id().wrap_err("Failed to generate id")
    }

    fn create_update_with_deserialization<V: DeserializeOwned + Serialize + Debug>(
        old_value: Option<&[u8]>,
        update_function: impl FnMut(V) -> V,
        mut get_default_value: impl FnMut() -> V,
    ) -> Option<Vec<u8>> {
        old_value
            .map_or_else(
                || Ok(get_default_value()),
                |v| bincode::deserialize::<V>(v).wrap_err("Failed to deserialize"),
            )
            .trace_err_ok()
            .map(update_function)
            .map(|new_value| bincode::serialize::<V>(&new_value).wrap_err("Failed to serialize"))
            .transpose()
            .trace_err_ok()
            .flatten()
            .or_else(|| old_value.map(|v| v.to_vec()))
    }

    fn open_tree(&self, name: impl AsRef<[u8]>) -> Result<Tree> {
        self.0.open_tree(name).wrap_err("Failed to open tree")
    }
}
