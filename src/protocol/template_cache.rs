use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::net::IpAddr;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Instant;

use lru::LruCache;

use super::template::Template;

/// Identifies the template that describes a given data set: the exporter
/// that sent it, its observation domain, and the template id itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateKey {
    pub exporter: IpAddr,
    pub domain_id: u32,
    pub template_id: u16,
}

fn layout_matches(a: &Template, b: &Template) -> bool {
    a.fields == b.fields && a.scope_field_count == b.scope_field_count
}

struct Entry {
    template: Template,
    last_seen: Instant,
}

struct Shard {
    templates: LruCache<TemplateKey, Entry>,
}

/// A sharded, per-exporter template cache. Sharded on `hash(exporter_ip)`
/// so that worker threads, which already pick their shard by the same hash
/// to preserve per-exporter record ordering, touch only their own shard's
/// lock. Each shard is independently LRU-bounded (a single noisy exporter
/// cycling through template ids can't starve the others) and swept for
/// idle templates by the janitor thread.
///
/// Sharding and LRU bounding exist so a relay under load from a noisy or
/// hostile exporter can't have one exporter's template churn starve, stall,
/// or exhaust memory for the rest.
pub struct TemplateCache {
    shards: Vec<Mutex<Shard>>,
}

impl TemplateCache {
    pub fn new(shard_count: usize, capacity_per_shard: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity_per_shard.max(1)).unwrap();
        let shards = (0..shard_count.max(1))
            .map(|_| {
                Mutex::new(Shard {
                    templates: LruCache::new(capacity),
                })
            })
            .collect();
        TemplateCache { shards }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Shard index for an exporter address; workers use this same function
    /// to pick which worker owns an exporter's datagrams.
    pub fn shard_index_for(exporter: IpAddr, shard_count: usize) -> usize {
        let mut hasher = DefaultHasher::new();
        exporter.hash(&mut hasher);
        (hasher.finish() as usize) % shard_count.max(1)
    }

    /// Caches `template` under `key`, replacing any prior definition.
    /// If a definition already exists for this key and its field layout
    /// differs from the incoming one, the version counter is bumped so
    /// in-flight decode state keyed on the old layout is recognizable as
    /// stale; an unchanged redefinition (e.g. a periodic template
    /// refresh) keeps the existing version.
    pub fn put(&self, key: TemplateKey, mut template: Template) {
        let idx = Self::shard_index_for(key.exporter, self.shards.len());
        let mut shard = self.shards[idx].lock().unwrap();
        template.version = match shard.templates.peek(&key) {
            Some(existing) if layout_matches(&existing.template, &template) => {
                existing.template.version
            }
            Some(existing) => existing.template.version + 1,
            None => 0,
        };
        shard.templates.put(
            key,
            Entry {
                template,
                last_seen: Instant::now(),
            },
        );
    }

    pub fn get(&self, key: &TemplateKey) -> Option<Template> {
        let idx = Self::shard_index_for(key.exporter, self.shards.len());
        let mut shard = self.shards[idx].lock().unwrap();
        if let Some(entry) = shard.templates.get_mut(key) {
            entry.last_seen = Instant::now();
            Some(entry.template.clone())
        } else {
            None
        }
    }

    /// Drops every template whose last observed use is older than
    /// `idle_timeout`. Returns how many were evicted, for the janitor
    /// thread's log line and the stats server's `templates` counter.
    pub fn sweep(&self, idle_timeout: std::time::Duration) -> usize {
        let now = Instant::now();
        let mut evicted = 0;
        for shard in &self.shards {
            let mut shard = shard.lock().unwrap();
            let stale: Vec<TemplateKey> = shard
                .templates
                .iter()
                .filter(|(_, entry)| now.duration_since(entry.last_seen) > idle_timeout)
                .map(|(key, _)| *key)
                .collect();
            for key in stale {
                shard.templates.pop(&key);
                evicted += 1;
            }
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.lock().unwrap().templates.len())
            .sum()
    }

    /// A point-in-time listing of every cached template, for the stats
    /// server's `templates` command: key, field count, and age since last
    /// use.
    pub fn entries(&self) -> Vec<(TemplateKey, usize, std::time::Duration, u32)> {
        let now = Instant::now();
        let mut out = Vec::new();
        for shard in &self.shards {
            let shard = shard.lock().unwrap();
            for (key, entry) in shard.templates.iter() {
                out.push((
                    *key,
                    entry.template.fields.len(),
                    now.duration_since(entry.last_seen),
                    entry.template.version,
                ));
            }
        }
        out
    }
}
