// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + validation loop using Burn's DataLoader and Adam.
//
// Per batch:  forward → masked CE → backward → clip global grad norm → Adam step
// Per epoch:  validation on the inner backend (dropout off),
//             metrics row, checkpoint when val_loss improves.
//
// Batches run strictly one after another; the only state
// carried between them is the model and the optimizer moments.

use std::{marker::PhantomData, time::Instant};

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::{AutodiffModule, ModuleVisitor, ParamId},
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::{rngs::StdRng, RngCore};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::TranslationBatcher, dataset::TranslationDataset};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{perplexity, EpochMetrics, MetricsLogger};
use crate::ml::evaluator::evaluate;
use crate::ml::seq2seq::{Seq2Seq, Seq2SeqConfig};

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Outcome of a full training run.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub best_val_loss: f64,
    pub best_epoch:    usize,
    pub history:       Vec<EpochMetrics>,
}

pub fn run_training(
    cfg:           &TrainConfig,
    model_cfg:     &Seq2SeqConfig,
    train_dataset: TranslationDataset,
    val_dataset:   TranslationDataset,
    ckpt_manager:  &CheckpointManager,
    rng:           &mut StdRng,
) -> Result<TrainReport> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_loop::<MyBackend>(cfg, model_cfg, train_dataset, val_dataset, ckpt_manager, rng, device)
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    model_cfg:     &Seq2SeqConfig,
    train_dataset: TranslationDataset,
    val_dataset:   TranslationDataset,
    ckpt_manager:  &CheckpointManager,
    rng:           &mut StdRng,
    device:        B::Device,
) -> Result<TrainReport> {

    // ── Seed the backend before any parameter is created ──────────────────────
    // Weight init and dropout masks both draw from the backend generator.
    B::seed(rng.next_u64());

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: Seq2Seq<B> = model_cfg.init(&device)?;
    tracing::info!(
        "Model ready: {}+{} blocks, emb={}, hid={}, {} trainable parameters",
        model_cfg.enc_layers, model_cfg.dec_layers,
        model_cfg.emb_dim, model_cfg.hid_dim, model.num_params(),
    );

    // ── Adam; clipping is applied to the whole gradient before each step ──────
    let mut optim = AdamConfig::new().init();

    // ── Loaders: training on B, validation on the inner backend ───────────────
    let pad_idx = model_cfg.trg_pad_idx as u32;
    let train_loader = DataLoaderBuilder::new(TranslationBatcher::<B>::new(device.clone(), pad_idx))
        .batch_size(cfg.batch_size)
        .shuffle(rng.next_u64())
        .num_workers(1)
        .build(train_dataset);

    let val_loader = DataLoaderBuilder::new(
        TranslationBatcher::<B::InnerBackend>::new(device.clone(), pad_idx),
    )
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    let metrics_logger = MetricsLogger::new(&cfg.checkpoint_dir)?;

    let mut best_val_loss = f64::INFINITY;
    let mut best_epoch    = 0usize;
    let mut history       = Vec::with_capacity(cfg.epochs);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        let started = Instant::now();

        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let (loss, _) = model.forward_loss(batch.src, batch.trg)?;

            train_loss_sum += loss.clone().into_scalar().elem::<f64>();
            train_batches  += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            let (grads, _) = clip_grad_norm(&model, grads, cfg.clip);
            model = optim.step(cfg.lr, model, grads);
        }

        let train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // model.valid() → Seq2Seq<B::InnerBackend>, dropout disabled
        let val = evaluate(&model.valid(), &val_loader)?;

        let metrics = EpochMetrics::new(epoch, train_loss, val.loss, started.elapsed().as_secs_f64());
        metrics_logger.log(&metrics)?;

        if metrics.is_improvement(best_val_loss) {
            best_val_loss = metrics.val_loss;
            best_epoch    = epoch;
            ckpt_manager.save_best(&model)?;
            tracing::info!("Validation loss improved at epoch {}, checkpoint saved", epoch);
        }

        let secs = metrics.epoch_secs as u64;
        println!("Epoch: {:02} | Time: {}m {}s", epoch, secs / 60, secs % 60);
        println!(
            "\tTrain Loss: {:.3} | Train PPL: {:7.3}",
            metrics.train_loss, perplexity(metrics.train_loss),
        );
        println!(
            "\t Val. Loss: {:.3} |  Val. PPL: {:7.3}",
            metrics.val_loss, perplexity(metrics.val_loss),
        );

        history.push(metrics);
    }

    tracing::info!("Training complete! Best val_loss={:.4} at epoch {}", best_val_loss, best_epoch);
    tracing::info!("Epoch metrics written to '{}'", metrics_logger.csv_path().display());
    Ok(TrainReport { best_val_loss, best_epoch, history })
}

/// Rescale all gradients so their joint L2 norm is at most `max_norm`.
/// Returns the clipped gradients and the norm measured before clipping.
pub fn clip_grad_norm<B: AutodiffBackend>(
    model:    &Seq2Seq<B>,
    grads:    GradientsParams,
    max_norm: f64,
) -> (GradientsParams, f64) {
    let mut norm_sq = GradNormSq::<B> { grads: &grads, total: 0.0, _backend: PhantomData };
    model.visit(&mut norm_sq);
    let norm = norm_sq.total.sqrt();

    if norm <= max_norm {
        return (grads, norm);
    }

    let mut scale = GradScale::<B> { grads, factor: max_norm / norm, _backend: PhantomData };
    model.visit(&mut scale);
    (scale.grads, norm)
}

struct GradNormSq<'a, B: AutodiffBackend> {
    grads:    &'a GradientsParams,
    total:    f64,
    _backend: PhantomData<B>,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for GradNormSq<'_, B> {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        if let Some(grad) = self.grads.get::<B::InnerBackend, D>(id) {
            self.total += grad.powf_scalar(2.0).sum().into_scalar().elem::<f64>();
        }
    }
}

struct GradScale<B: AutodiffBackend> {
    grads:    GradientsParams,
    factor:   f64,
    _backend: PhantomData<B>,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for GradScale<B> {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        if let Some(grad) = self.grads.remove::<B::InnerBackend, D>(id) {
            self.grads.register::<B::InnerBackend, D>(id, grad.mul_scalar(self.factor));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::TranslationSample;
    use burn::backend::{Autodiff, NdArray};
    use rand::SeedableRng;

    type TestBackend = Autodiff<NdArray>;

    fn dataset() -> TranslationDataset {
        TranslationDataset::new(vec![
            TranslationSample::new(vec![2, 4, 5, 3], vec![2, 6, 7, 3]),
            TranslationSample::new(vec![2, 5, 3], vec![2, 7, 3]),
            TranslationSample::new(vec![2, 4, 3], vec![2, 6, 3]),
            TranslationSample::new(vec![2, 5, 4, 3], vec![2, 7, 6, 3]),
        ])
    }

    fn small_model_cfg() -> Seq2SeqConfig {
        Seq2SeqConfig::new(8, 8, 1)
            .with_emb_dim(8)
            .with_hid_dim(16)
            .with_enc_layers(1)
            .with_dec_layers(1)
    }

    fn grads_for(model: &Seq2Seq<TestBackend>, device: &<TestBackend as Backend>::Device) -> GradientsParams {
        let src = Tensor::<TestBackend, 1, Int>::from_ints([2, 4, 5, 3], device).reshape([1, 4]);
        let trg = Tensor::<TestBackend, 1, Int>::from_ints([2, 6, 7, 3], device).reshape([1, 4]);
        let (loss, _) = model.forward_loss(src, trg).unwrap();
        GradientsParams::from_grads(loss.backward(), model)
    }

    #[test]
    fn test_clip_bounds_joint_gradient_norm() {
        let device = Default::default();
        let model: Seq2Seq<TestBackend> = small_model_cfg().init(&device).unwrap();

        let (grads, norm) = clip_grad_norm(&model, grads_for(&model, &device), f64::INFINITY);
        assert!(norm > 0.0);

        let max_norm = norm / 10.0;
        let (clipped, before) = clip_grad_norm(&model, grads, max_norm);
        assert_eq!(before, norm);

        // every tensor shares one factor, so the joint norm lands on the bound
        let (_, after) = clip_grad_norm(&model, clipped, f64::INFINITY);
        assert!((after - max_norm).abs() < 1e-4 * max_norm, "{after} vs {max_norm}");
    }

    #[test]
    fn test_clip_leaves_small_gradients_alone() {
        let device = Default::default();
        let model: Seq2Seq<TestBackend> = small_model_cfg().init(&device).unwrap();

        let (grads, norm) = clip_grad_norm(&model, grads_for(&model, &device), f64::INFINITY);
        let (kept, _)     = clip_grad_norm(&model, grads, norm * 2.0);
        let (_, after)    = clip_grad_norm(&model, kept, f64::INFINITY);
        assert_eq!(after, norm);
    }

    #[test]
    fn test_training_writes_checkpoint_and_metrics() {
        let dir = std::env::temp_dir().join(format!("conv_seq2seq_trainer_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let cfg = TrainConfig {
            checkpoint_dir: dir.to_string_lossy().into_owned(),
            epochs:         3,
            batch_size:     2,
            lr:             1e-3,
            ..TrainConfig::default()
        };
        let model_cfg = small_model_cfg();
        let ckpt = CheckpointManager::new(dir.to_string_lossy());
        let mut rng = StdRng::seed_from_u64(7);

        let report = train_loop::<TestBackend>(
            &cfg, &model_cfg, dataset(), dataset(), &ckpt, &mut rng, Default::default(),
        )
        .unwrap();

        assert_eq!(report.history.len(), 3);
        assert!(report.best_val_loss.is_finite());
        assert!((1..=3).contains(&report.best_epoch));
        assert!(ckpt.has_best::<TestBackend>());

        let csv = std::fs::read_to_string(dir.join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 4);

        std::fs::remove_dir_all(&dir).ok();
    }
}
