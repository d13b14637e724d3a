//! Pipeline framework
//!
//! Extractors generate candidates from a source and thread them through a
//! [`MapperList`]. Mappers see the whole lazy stream, so a stage can filter
//! or transform item by item, or look across items (merging, picking the
//! closest). Stages carry stable names and can be switched off while the
//! pipeline is being configured; a disabled stage passes items through.

use std::fmt;

use ore_core::Result;

/// Lazy stream of pipeline items
pub type ItemStream<'a, T> = Box<dyn Iterator<Item = T> + 'a>;

// ============================================================================
// Mappers
// ============================================================================

/// A named stream-to-stream transform
pub trait Mapper<T: 'static>: Send + Sync {
    /// Stable stage name, used to enable or disable the stage
    fn name(&self) -> &str;

    fn map<'a>(&'a self, items: ItemStream<'a, T>) -> ItemStream<'a, T>;
}

/// Keeps items for which the predicate holds
pub struct FilterMapper<T, F> {
    name: String,
    predicate: F,
    _item: std::marker::PhantomData<fn(&T)>,
}

impl<T, F> FilterMapper<T, F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    pub fn new(name: impl Into<String>, predicate: F) -> Self {
        Self {
            name: name.into(),
            predicate,
            _item: std::marker::PhantomData,
        }
    }
}

impl<T: 'static, F> Mapper<T> for FilterMapper<T, F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn map<'a>(&'a self, items: ItemStream<'a, T>) -> ItemStream<'a, T> {
        Box::new(items.filter(move |item| (self.predicate)(item)))
    }
}

/// Applies a per-item transform, one output per input
pub struct IndependentMapper<T, F> {
    name: String,
    transform: F,
    _item: std::marker::PhantomData<fn(T) -> T>,
}

impl<T, F> IndependentMapper<T, F>
where
    F: Fn(T) -> T + Send + Sync,
{
    pub fn new(name: impl Into<String>, transform: F) -> Self {
        Self {
            name: name.into(),
            transform,
            _item: std::marker::PhantomData,
        }
    }
}

impl<T: 'static, F> Mapper<T> for IndependentMapper<T, F>
where
    F: Fn(T) -> T + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn map<'a>(&'a self, items: ItemStream<'a, T>) -> ItemStream<'a, T> {
        Box::new(items.map(move |item| (self.transform)(item)))
    }
}

struct Stage<T> {
    mapper: Box<dyn Mapper<T>>,
    enabled: bool,
}

/// Ordered list of stages; each stage's output feeds the next
pub struct MapperList<T> {
    name: String,
    stages: Vec<Stage<T>>,
}

impl<T: 'static> MapperList<T> {
    pub fn new() -> Self {
        Self::named("mappers")
    }

    /// Empty list with a name, used when the list is nested as a stage
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    /// Append a stage
    pub fn push(&mut self, mapper: impl Mapper<T> + 'static) {
        self.stages.push(Stage {
            mapper: Box::new(mapper),
            enabled: true,
        });
    }

    /// Builder form of [`push`](Self::push)
    pub fn with(mut self, mapper: impl Mapper<T> + 'static) -> Self {
        self.push(mapper);
        self
    }

    /// Append a filter stage
    pub fn filter<F>(self, name: &str, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.with(FilterMapper::new(name, predicate))
    }

    /// Enable or disable every stage called `name`. Returns whether any
    /// stage had that name.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        let mut found = false;
        for stage in self.stages.iter_mut().filter(|s| s.mapper.name() == name) {
            stage.enabled = enabled;
            found = true;
        }
        found
    }

    /// Disable each named stage; returns the names that matched nothing
    pub fn disable_all<'n>(&mut self, names: impl IntoIterator<Item = &'n str>) -> Vec<&'n str> {
        names
            .into_iter()
            .filter(|name| !self.set_enabled(name, false))
            .collect()
    }

    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.stages
            .iter()
            .find(|s| s.mapper.name() == name)
            .map(|s| s.enabled)
    }

    /// Stage names in application order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.mapper.name())
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run the enabled stages over `items` in order
    pub fn apply<'a>(&'a self, items: ItemStream<'a, T>) -> ItemStream<'a, T> {
        self.stages
            .iter()
            .filter(|s| s.enabled)
            .fold(items, |stream, stage| stage.mapper.map(stream))
    }
}

impl<T: 'static> Default for MapperList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Mapper<T> for MapperList<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn map<'a>(&'a self, items: ItemStream<'a, T>) -> ItemStream<'a, T> {
        self.apply(items)
    }
}

impl<T: 'static> fmt::Debug for MapperList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.stages.iter().map(|s| (s.mapper.name(), s.enabled)))
            .finish()
    }
}

// ============================================================================
// Extractors
// ============================================================================

/// Candidate generator followed by refinement stages
pub trait Extractor<S, T: 'static>: Send + Sync {
    /// Unfiltered candidates for `source`
    fn candidates(&self, source: &S) -> Result<Vec<T>>;

    fn mappers(&self) -> &MapperList<T>;

    fn mappers_mut(&mut self) -> &mut MapperList<T>;

    /// Candidates threaded through the mapper stages
    fn extract<'a>(&'a self, source: &S) -> Result<ItemStream<'a, T>> {
        let candidates = self.candidates(source)?;
        Ok(self.mappers().apply(Box::new(candidates.into_iter())))
    }
}

/// Concatenates the outputs of several extractors over the same source,
/// then runs its own stages
pub struct ExtractorUnion<S, T> {
    extractors: Vec<Box<dyn Extractor<S, T>>>,
    mappers: MapperList<T>,
}

impl<S, T: 'static> ExtractorUnion<S, T> {
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
            mappers: MapperList::new(),
        }
    }

    pub fn add(&mut self, extractor: impl Extractor<S, T> + 'static) {
        self.extractors.push(Box::new(extractor));
    }

    pub fn with(mut self, extractor: impl Extractor<S, T> + 'static) -> Self {
        self.add(extractor);
        self
    }

    pub fn with_mappers(mut self, mappers: MapperList<T>) -> Self {
        self.mappers = mappers;
        self
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

impl<S, T: 'static> Default for ExtractorUnion<S, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, T> Extractor<S, T> for ExtractorUnion<S, T>
where
    T: Send + Sync + 'static,
    S: 'static,
{
    fn candidates(&self, source: &S) -> Result<Vec<T>> {
        let mut all = Vec::new();
        for extractor in &self.extractors {
            all.extend(extractor.extract(source)?);
        }
        Ok(all)
    }

    fn mappers(&self) -> &MapperList<T> {
        &self.mappers
    }

    fn mappers_mut(&mut self) -> &mut MapperList<T> {
        &mut self.mappers
    }
}

// ============================================================================
// Tests
// ============================================================================
