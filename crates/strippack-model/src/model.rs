// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use crate::index::ItemIndex;
use num_traits::{PrimInt, Signed, ToPrimitive};

/// Widens a model value for error reporting.
#[inline(always)]
fn widen<T: ToPrimitive>(value: T) -> i64 {
    value.to_i64().unwrap_or(i64::MAX)
}

/// Reasons a packing instance is rejected before any search takes place.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("the instance contains no items")]
    NoItems,
    #[error("strip height must be positive, got {strip_height}")]
    NonPositiveStripHeight { strip_height: i64 },
    #[error("{item} has non-positive width {width}")]
    NonPositiveWidth { item: ItemIndex, width: i64 },
    #[error("{item} has non-positive height {height}")]
    NonPositiveHeight { item: ItemIndex, height: i64 },
    #[error("{item} has height {height} which exceeds the strip height {strip_height}")]
    ItemTallerThanStrip {
        item: ItemIndex,
        height: i64,
        strip_height: i64,
    },
    #[error("the sum of item widths does not fit the numeric type")]
    WidthOverflow,
    #[error("a dependency refers to {item}, which is not part of the instance")]
    UnknownDependencyItem { item: ItemIndex },
    #[error("{item} cannot depend on itself")]
    SelfDependency { item: ItemIndex },
    #[error("the dependency of {consumer} has negative operation cost {op_cost}")]
    NegativeOperationCost { consumer: ItemIndex, op_cost: i64 },
}

/// A single rectangle of the instance. Orientation is fixed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Item<T> {
    index: ItemIndex,
    width: T,
    height: T,
}

impl<T> Item<T>
where
    T: PrimInt + Signed,
{
    #[inline]
    pub fn index(&self) -> ItemIndex {
        self.index
    }

    #[inline]
    pub fn width(&self) -> T {
        self.width
    }

    #[inline]
    pub fn height(&self) -> T {
        self.height
    }

    /// Returns `width * height`, widened so it cannot overflow.
    #[inline]
    pub fn area(&self) -> i128 {
        let w = self.width.to_i128().unwrap_or(i128::MAX);
        let h = self.height.to_i128().unwrap_or(i128::MAX);
        w.saturating_mul(h)
    }
}

impl<T> std::fmt::Display for Item<T>
where
    T: PrimInt + Signed + std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Item(index: {}, width: {}, height: {})",
            self.index.get(),
            self.width,
            self.height
        )
    }
}

/// A data dependency between two items along the x axis.
///
/// `consumer` reads the data held by `producer`, so `producer` must already
/// be placed when `consumer` starts and must stay alive for the first
/// `op_cost` units of `consumer`:
///
/// - `x_producer <= x_consumer`
/// - `x_consumer + op_cost <= x_producer + w_producer`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dependency<T> {
    producer: ItemIndex,
    consumer: ItemIndex,
    op_cost: T,
}

impl<T> Dependency<T>
where
    T: PrimInt + Signed,
{
    #[inline]
    pub fn new(producer: ItemIndex, consumer: ItemIndex, op_cost: T) -> Self {
        Self {
            producer,
            consumer,
            op_cost,
        }
    }

    /// The item whose data is read.
    #[inline]
    pub fn producer(&self) -> ItemIndex {
        self.producer
    }

    /// The item that reads the data.
    #[inline]
    pub fn consumer(&self) -> ItemIndex {
        self.consumer
    }

    /// How long the consumer needs the producer after starting.
    #[inline]
    pub fn op_cost(&self) -> T {
        self.op_cost
    }
}

impl<T> std::fmt::Display for Dependency<T>
where
    T: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Dependency(producer: {}, consumer: {}, op_cost: {})",
            self.producer.get(),
            self.consumer.get(),
            self.op_cost
        )
    }
}

/// The immutable description of a strip packing instance.
///
/// Holds the item dimensions in input order and the strip height `H`.
/// The sum of all widths (`h_max`) is precomputed: it is the width of the
/// trivial side-by-side layout and therefore the initial upper bound on the
/// objective as well as the extent of every x domain.
///
/// Optional `Dependency` constraints tie items together along the x axis.
/// They never push the optimum beyond `h_max`: a feasible layout can always
/// be compacted until no x position is left uncovered.
///
/// Construction goes through `ModelBuilder`, which validates every
/// dimension. `ModelBuilder::build_relaxed` skips the check that items fit
/// the strip so the solver itself can prove such instances infeasible.
#[derive(Clone)]
pub struct Model<T>
where
    T: PrimInt + Signed,
{
    widths: Vec<T>,  // len = num_items
    heights: Vec<T>, // len = num_items
    dependencies: Vec<Dependency<T>>,
    strip_height: T,
    total_width: T,
}

impl<T> Model<T>
where
    T: PrimInt + Signed,
{
    /// Builds and validates a model from `(width, height)` pairs.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use strippack_model::model::Model;
    ///
    /// let model = Model::<i64>::from_dimensions(10, &[(3, 4), (2, 7)]).unwrap();
    /// assert_eq!(model.num_items(), 2);
    /// assert_eq!(model.total_width(), 5);
    /// ```
    pub fn from_dimensions(strip_height: T, dimensions: &[(T, T)]) -> Result<Self, ModelError> {
        let mut builder = ModelBuilder::with_capacity(strip_height, dimensions.len());
        for &(width, height) in dimensions {
            builder.add_item(width, height);
        }
        builder.build()
    }

    #[inline]
    pub fn num_items(&self) -> usize {
        self.widths.len()
    }

    /// Returns the number of unordered item pairs `n * (n - 1) / 2`.
    #[inline]
    pub fn num_pairs(&self) -> usize {
        let n = self.num_items();
        n * n.saturating_sub(1) / 2
    }

    #[inline]
    pub fn strip_height(&self) -> T {
        self.strip_height
    }

    /// Returns the sum of all item widths.
    #[inline]
    pub fn total_width(&self) -> T {
        self.total_width
    }

    #[inline]
    pub fn widths(&self) -> &[T] {
        &self.widths
    }

    #[inline]
    pub fn heights(&self) -> &[T] {
        &self.heights
    }

    /// Returns the width of the item at `item_index`.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `item_index` is out of bounds.
    #[inline]
    pub fn item_width(&self, item_index: ItemIndex) -> T {
        let index = item_index.get();
        debug_assert!(
            index < self.num_items(),
            "called `Model::item_width` with item index out of bounds: the len is {} but the index is {}",
            self.num_items(),
            index
        );
        self.widths[index]
    }

    /// Returns the height of the item at `item_index`.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `item_index` is out of bounds.
    #[inline]
    pub fn item_height(&self, item_index: ItemIndex) -> T {
        let index = item_index.get();
        debug_assert!(
            index < self.num_items(),
            "called `Model::item_height` with item index out of bounds: the len is {} but the index is {}",
            self.num_items(),
            index
        );
        self.heights[index]
    }

    #[inline]
    pub fn item(&self, item_index: ItemIndex) -> Item<T> {
        Item {
            index: item_index,
            width: self.item_width(item_index),
            height: self.item_height(item_index),
        }
    }

    /// Iterates over all items in input order.
    pub fn items(&self) -> impl ExactSizeIterator<Item = Item<T>> + '_ {
        ItemIndex::range(self.num_items()).map(move |i| self.item(i))
    }

    /// Returns the total area of all items, widened to `i128`.
    pub fn total_area(&self) -> i128 {
        self.items().map(|item| item.area()).sum()
    }

    /// Returns `true` if every item fits the strip vertically.
    pub fn fits_strip(&self) -> bool {
        self.heights.iter().all(|&h| h <= self.strip_height)
    }

    /// Returns the dependencies in the order they were added.
    #[inline]
    pub fn dependencies(&self) -> &[Dependency<T>] {
        &self.dependencies
    }

    #[inline]
    pub fn num_dependencies(&self) -> usize {
        self.dependencies.len()
    }

    #[inline]
    pub fn has_dependencies(&self) -> bool {
        !self.dependencies.is_empty()
    }
}

impl<T> std::fmt::Debug for Model<T>
where
    T: PrimInt + Signed + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("widths", &self.widths)
            .field("heights", &self.heights)
            .field("dependencies", &self.dependencies)
            .field("strip_height", &self.strip_height)
            .field("total_width", &self.total_width)
            .finish()
    }
}

impl<T> std::fmt::Display for Model<T>
where
    T: PrimInt + Signed + std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Model(num_items: {}, strip_height: {}, total_width: {})",
            self.num_items(),
            self.strip_height,
            self.total_width
        )
    }
}

/// Collects items and validates them into a `Model`.
///
/// # Examples
///
/// ```rust
/// # use strippack_model::model::ModelBuilder;
///
/// let mut builder = ModelBuilder::<i64>::new(10);
/// let first = builder.add_item(3, 4);
/// builder.add_item(5, 6);
/// let model = builder.build().unwrap();
/// assert_eq!(model.item_width(first), 3);
/// assert_eq!(model.total_width(), 8);
/// ```
#[derive(Clone, Debug)]
pub struct ModelBuilder<T>
where
    T: PrimInt + Signed,
{
    strip_height: T,
    widths: Vec<T>,
    heights: Vec<T>,
    dependencies: Vec<Dependency<T>>,
}

impl<T> ModelBuilder<T>
where
    T: PrimInt + Signed,
{
    pub fn new(strip_height: T) -> Self {
        Self::with_capacity(strip_height, 0)
    }

    pub fn with_capacity(strip_height: T, num_items: usize) -> Self {
        Self {
            strip_height,
            widths: Vec::with_capacity(num_items),
            heights: Vec::with_capacity(num_items),
            dependencies: Vec::new(),
        }
    }

    #[inline]
    pub fn num_items(&self) -> usize {
        self.widths.len()
    }

    /// Appends an item and returns its index. Validation is deferred to `build`.
    pub fn add_item(&mut self, width: T, height: T) -> ItemIndex {
        let index = ItemIndex::new(self.widths.len());
        self.widths.push(width);
        self.heights.push(height);
        index
    }

    /// Makes `consumer` depend on `producer` for `op_cost` units of width.
    /// Validation is deferred to `build`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use strippack_model::model::ModelBuilder;
    ///
    /// let mut builder = ModelBuilder::<i64>::new(10);
    /// let input = builder.add_item(4, 3);
    /// let output = builder.add_item(2, 5);
    /// builder.add_dependency(input, output, 1);
    /// let model = builder.build().unwrap();
    /// assert_eq!(model.num_dependencies(), 1);
    /// ```
    pub fn add_dependency(&mut self, producer: ItemIndex, consumer: ItemIndex, op_cost: T) {
        self.dependencies
            .push(Dependency::new(producer, consumer, op_cost));
    }

    /// Validates the collected items and builds the model.
    ///
    /// # Errors
    ///
    /// Returns a `ModelError` if there are no items, any dimension is
    /// non-positive, any item is taller than the strip, the widths overflow
    /// `T`, or a dependency is malformed.
    pub fn build(self) -> Result<Model<T>, ModelError> {
        if let Some(index) = self.heights.iter().position(|&h| h > self.strip_height) {
            // Dimension errors on earlier items take precedence.
            self.validate_dimensions()?;
            return Err(ModelError::ItemTallerThanStrip {
                item: ItemIndex::new(index),
                height: widen(self.heights[index]),
                strip_height: widen(self.strip_height),
            });
        }
        self.build_relaxed()
    }

    /// Builds the model without requiring items to fit the strip vertically.
    ///
    /// An item taller than the strip makes the instance infeasible; the
    /// solver proves this instead of the builder rejecting it.
    ///
    /// # Errors
    ///
    /// Returns a `ModelError` for every other validation failure of `build`.
    pub fn build_relaxed(self) -> Result<Model<T>, ModelError> {
        let total_width = self.validate_dimensions()?;
        self.validate_dependencies()?;
        Ok(Model {
            widths: self.widths,
            heights: self.heights,
            dependencies: self.dependencies,
            strip_height: self.strip_height,
            total_width,
        })
    }

    fn validate_dimensions(&self) -> Result<T, ModelError> {
        if self.widths.is_empty() {
            return Err(ModelError::NoItems);
        }
        if self.strip_height <= T::zero() {
            return Err(ModelError::NonPositiveStripHeight {
                strip_height: widen(self.strip_height),
            });
        }

        let mut total = T::zero();
        for (index, (&width, &height)) in self.widths.iter().zip(&self.heights).enumerate() {
            let item = ItemIndex::new(index);
            if width <= T::zero() {
                return Err(ModelError::NonPositiveWidth {
                    item,
                    width: widen(width),
                });
            }
            if height <= T::zero() {
                return Err(ModelError::NonPositiveHeight {
                    item,
                    height: widen(height),
                });
            }
            total = total.checked_add(&width).ok_or(ModelError::WidthOverflow)?;
        }

        // The search uses `total + 1` as its initial cutoff.
        if total == T::max_value() {
            return Err(ModelError::WidthOverflow);
        }
        Ok(total)
    }

    fn validate_dependencies(&self) -> Result<(), ModelError> {
        let n = self.widths.len();
        for dependency in &self.dependencies {
            let (producer, consumer) = (dependency.producer(), dependency.consumer());
            if let Some(item) = [producer, consumer].into_iter().find(|i| i.get() >= n) {
                return Err(ModelError::UnknownDependencyItem { item });
            }
            if producer == consumer {
                return Err(ModelError::SelfDependency { item: producer });
            }
            if dependency.op_cost() < T::zero() {
                return Err(ModelError::NegativeOperationCost {
                    consumer,
                    op_cost: widen(dependency.op_cost()),
                });
            }
        }
        Ok(())
    }
}

impl<T> std::fmt::Display for ModelBuilder<T>
where
    T: PrimInt + Signed + std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ModelBuilder(num_items: {}, strip_height: {})",
            self.num_items(),
            self.strip_height
        )
    }
}
