use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use storeflow::{ContextData, FlowError, Flows, Pipeline, PipelineControl};
use tokio::runtime::Runtime;

#[derive(Clone, Debug, Default)]
struct BenchContext {
  counter: u64,
}

type BenchError = FlowError;

fn increment_handler() -> storeflow::Handler<BenchContext, BenchError> {
  Box::new(move |ctx: ContextData<BenchContext>| {
    Box::pin(async move {
      ctx.write().counter += 1;
      Ok(PipelineControl::Continue)
    })
  })
}

fn build_pipeline(num_steps: usize) -> Pipeline<BenchContext, BenchError> {
  let names: Vec<String> = (0..num_steps).map(|i| format!("step_{}", i)).collect();
  let defs: Vec<(&str, bool, Option<storeflow::SkipCondition<BenchContext>>)> =
    names.iter().map(|n| (n.as_str(), false, None)).collect();
  let mut pipeline = Pipeline::new(&defs);
  for name in &names {
    pipeline.on(name, increment_handler());
  }
  pipeline
}

fn bench_pipeline_steps(c: &mut Criterion) {
  let mut group = c.benchmark_group("PipelineSteps");
  let rt = Runtime::new().unwrap();

  for num_steps in [1usize, 8, 32] {
    let pipeline = Arc::new(build_pipeline(num_steps));
    group.throughput(Throughput::Elements(num_steps as u64));
    group.bench_with_input(BenchmarkId::from_parameter(num_steps), &num_steps, |b, _| {
      b.to_async(&rt).iter_batched(
        || ContextData::new(BenchContext::default()),
        |ctx| {
          let p = pipeline.clone();
          async move { p.run(ctx).await.unwrap() }
        },
        criterion::BatchSize::SmallInput,
      );
    });
  }
  group.finish();
}

fn bench_registry_dispatch(c: &mut Criterion) {
  let mut group = c.benchmark_group("RegistryDispatch");
  let rt = Runtime::new().unwrap();

  let flows = Arc::new(Flows::<BenchError>::new());
  flows.register(build_pipeline(4));

  group.bench_function("dispatch_four_steps", |b| {
    b.to_async(&rt).iter_batched(
      || ContextData::new(BenchContext::default()),
      |ctx| {
        let f = flows.clone();
        async move { f.run(ctx).await.unwrap() }
      },
      criterion::BatchSize::SmallInput,
    );
  });
  group.finish();
}

criterion_group!(benches, bench_pipeline_steps, bench_registry_dispatch);
criterion_main!(benches);
