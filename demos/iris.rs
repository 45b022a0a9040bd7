//! Selecting rows of a slice of the iris dataset.
//!
//! Run with `cargo run --example iris`.

use std::{error::Error, io::Cursor, sync::Arc};

use arrow::{
    compute::concat_batches,
    csv::ReaderBuilder,
    datatypes::{DataType, Field, Schema},
};
use dataselect::{
    label_rows, labels_to_array, Dataset, Localizable, Localizer, RangeQuery, Sample, Selector,
    UniqueElements,
};

const IRIS: &str = "\
sepal.length,sepal.width,petal.length,petal.width,variety
5.1,3.5,1.4,0.2,Setosa
4.9,3,1.4,0.2,Setosa
4.7,3.2,1.3,0.2,Setosa
4.6,3.1,1.5,0.2,Setosa
5,3.6,1.4,0.2,Setosa
5.4,3.9,1.7,0.4,Setosa
4.6,3.4,1.4,0.3,Setosa
5.7,3.8,1.7,0.3,Setosa
7,3.2,4.7,1.4,Versicolor
6.4,3.2,4.5,1.5,Versicolor
6.9,3.1,4.9,1.5,Versicolor
5.5,2.3,4,1.3,Versicolor
6.5,2.8,4.6,1.5,Versicolor
5.7,2.8,4.5,1.3,Versicolor
6.3,3.3,4.7,1.6,Versicolor
4.9,2.4,3.3,1,Versicolor
6.3,3.3,6,2.5,Virginica
5.8,2.7,5.1,1.9,Virginica
7.1,3,5.9,2.1,Virginica
6.3,2.9,5.6,1.8,Virginica
6.5,3,5.8,2.2,Virginica
7.6,3,6.6,2.1,Virginica
4.9,2.5,4.5,1.7,Virginica
7.3,2.9,6.3,1.8,Virginica
";

fn load_iris() -> Result<Dataset, Box<dyn Error>> {
    let mut fields: Vec<Field> = ["sepal.length", "sepal.width", "petal.length", "petal.width"]
        .into_iter()
        .map(|name| Field::new(name, DataType::Float64, false))
        .collect();
    fields.push(Field::new("variety", DataType::Utf8, false));
    let schema = Arc::new(Schema::new(fields));

    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .build(Cursor::new(IRIS))?;
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    Ok(Dataset::new(concat_batches(&schema, &batches)?))
}

fn main() -> Result<(), Box<dyn Error>> {
    let iris = load_iris()?;

    // Localizers fix the column once; `on` binds a single selector in place.
    let sepal_length = Localizer::new("sepal.length");
    let petal_length = Localizer::new("petal.length");

    // Sepal length outside [5, 6), as a union and as a complement.
    let outside: Selector =
        sepal_length.bind(RangeQuery::max(5)) | sepal_length.bind(RangeQuery::min(6));
    println!("{}", outside.apply(&iris)?);
    println!(
        "expression: {}",
        outside.to_expression().transpose()?.unwrap_or_default()
    );

    let outside_too = !RangeQuery::between(5, 6).on("sepal.length");
    assert_eq!(outside.get_indices(&iris)?, outside_too.get_indices(&iris)?);

    // Five rows sampled from that box, written two equivalent ways.
    let sampled = outside.clone() >> Sample::new(5).seed(0);
    let explicit = Selector::from(Sample::new(5).seed(0).with_base(&outside));
    assert_eq!(sampled.get_indices(&iris)?, explicit.get_indices(&iris)?);
    println!("{}", sampled.apply(&iris)?);

    // The third row of each variety.
    let third_per_variety = UniqueElements::new("variety").with_indexer(|_| 2);
    println!("{}", Selector::from(third_per_variety.clone()).apply(&iris)?);
    println!(
        "indices: {:?}",
        Selector::from(third_per_variety).get_indices(&iris)?.to_vec()
    );

    // Nominal petal length labels.
    let labels = label_rows(
        &iris,
        &[
            (Selector::from(petal_length.bind(RangeQuery::max(3))), "short_petal"),
            (
                Selector::from(petal_length.bind(RangeQuery::between(3, 6))),
                "medium_petal",
            ),
            (Selector::from(petal_length.bind(RangeQuery::min(6))), "long_petal"),
        ],
    )?;
    let labelled = iris.with_column(
        "petal.length.nominal",
        Arc::new(labels_to_array(&labels)),
    )?;
    println!("{labelled}");

    Ok(())
}
