use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decode a recording into mono f32 samples at its native rate.
///
/// Multi-channel recordings are averaged down to one channel. No resampling:
/// band edges are expressed in Hz and follow whatever rate the file carries.
///
/// # Errors
/// Returns an error if the file cannot be opened, probed or has no track.
///
/// # Example
/// ```no_run
/// use eeg_audio::decode::decode_file;
/// let (samples, sample_rate) = decode_file("session.wav").unwrap();
/// ```
pub fn decode_file(path: impl AsRef<Path>) -> Result<(Vec<f32>, u32)> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Impossible d'ouvrir l'enregistrement : {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("Format audio non reconnu")?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .context("Aucune piste audio par défaut")?;

    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Fréquence d'échantillonnage absente du fichier")?;
    let channels = track
        .codec_params
        .channels
        .map_or(1, symphonia::core::audio::Channels::count)
        .max(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Impossible de créer le décodeur")?;

    let track_id = track.id;
    let mut all_samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut max_sample_frames: usize = 0;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                log::warn!("decode packet error: {e}");
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("decode frame error: {e}");
                continue;
            }
        };

        let spec = *decoded.spec();
        let num_frames = decoded.capacity();
        // Reallocate only for a packet larger than any seen so far
        if sample_buf.is_none() || num_frames > max_sample_frames {
            sample_buf = Some(SampleBuffer::<f32>::new(num_frames as u64, spec));
            max_sample_frames = num_frames;
        }
        let Some(buf) = sample_buf.as_mut() else {
            continue;
        };
        buf.copy_interleaved_ref(decoded);

        all_samples.extend(
            buf.samples()
                .chunks(channels)
                .map(|chunk| chunk.iter().sum::<f32>() / channels as f32),
        );
    }

    log::info!(
        "Décodé {} échantillons @ {}Hz ({} canaux) depuis {}",
        all_samples.len(),
        sample_rate,
        channels,
        path.display()
    );

    Ok((all_samples, sample_rate))
}
