use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{
    BufferSize, FromSample, SampleFormat, SampleRate, SizedSample, StreamConfig,
    SupportedStreamConfigRange,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use tenor_ports::audio::{AudioError, AudioOutputPort, AudioRenderCallback, AudioStreamHandle};
use tenor_ports::types::{AudioConfig, AudioOutputDevice, DeviceId};

pub struct CpalAudioOutputPort {
    host: cpal::Host,
}

struct SelectedStreamConfig {
    config: StreamConfig,
    sample_format: SampleFormat,
}

enum Control {
    Play(mpsc::SyncSender<Result<(), AudioError>>),
    Pause(mpsc::SyncSender<Result<(), AudioError>>),
    Close,
}

impl CpalAudioOutputPort {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    fn list_devices_from_host(
        host: &cpal::Host,
    ) -> Result<Vec<(DeviceId, cpal::Device)>, AudioError> {
        let host_id = format!("{:?}", host.id());
        let devices = host
            .output_devices()
            .map_err(|e| AudioError::Backend(e.to_string()))?;

        let list = devices
            .enumerate()
            .map(|(index, device)| {
                let name = device
                    .name()
                    .unwrap_or_else(|_| "Unknown Output".to_string());
                (DeviceId(format!("cpal:{}:{}:{}", host_id, index, name)), device)
            })
            .collect();
        Ok(list)
    }

    fn select_stream_config(
        device: &cpal::Device,
        desired: AudioConfig,
    ) -> Result<SelectedStreamConfig, AudioError> {
        let mut supported = device
            .supported_output_configs()
            .map_err(|e| AudioError::Backend(e.to_string()))?;

        let chosen = select_supported_config(&mut supported, desired)?;
        let sample_format = chosen.sample_format();
        let mut config = chosen.config();
        config.buffer_size = match desired.buffer_size_frames {
            Some(frames) => BufferSize::Fixed(frames),
            None => BufferSize::Default,
        };

        Ok(SelectedStreamConfig {
            config,
            sample_format,
        })
    }
}

impl Default for CpalAudioOutputPort {
    fn default() -> Self {
        Self::new()
    }
}

pub struct CpalAudioStreamHandle {
    control_tx: mpsc::Sender<Control>,
    suspended: Arc<AtomicBool>,
    join_handle: Option<thread::JoinHandle<()>>,
}

impl CpalAudioStreamHandle {
    fn request(
        &self,
        make: impl FnOnce(mpsc::SyncSender<Result<(), AudioError>>) -> Control,
    ) -> Result<(), AudioError> {
        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        self.control_tx
            .send(make(reply_tx))
            .map_err(|e| AudioError::Backend(e.to_string()))?;
        reply_rx
            .recv()
            .map_err(|e| AudioError::Backend(e.to_string()))?
    }
}

impl AudioStreamHandle for CpalAudioStreamHandle {
    fn suspend(&self) -> Result<(), AudioError> {
        self.request(Control::Pause)
    }

    fn resume(&self) -> Result<(), AudioError> {
        self.request(Control::Play)
    }

    fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Relaxed)
    }

    fn close(mut self: Box<Self>) {
        let _ = self.control_tx.send(Control::Close);
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.join();
        }
    }
}

impl AudioOutputPort for CpalAudioOutputPort {
    fn list_outputs(&self) -> Result<Vec<AudioOutputDevice>, AudioError> {
        let devices = Self::list_devices_from_host(&self.host)?;
        let mut results = Vec::new();

        for (id, device) in devices {
            let name = device
                .name()
                .unwrap_or_else(|_| "Unknown Output".to_string());
            let default_config = match device.default_output_config() {
                Ok(config) => config,
                Err(_) => continue,
            };

            results.push(AudioOutputDevice {
                id,
                name,
                default_config: AudioConfig {
                    sample_rate_hz: default_config.sample_rate().0,
                    channels: default_config.channels(),
                    buffer_size_frames: None,
                },
            });
        }

        Ok(results)
    }

    fn default_output(&self) -> Result<Option<DeviceId>, AudioError> {
        let Some(default) = self.host.default_output_device() else {
            return Ok(None);
        };
        let default_name = default.name().ok();
        let devices = Self::list_devices_from_host(&self.host)?;
        Ok(devices
            .into_iter()
            .find(|(_, device)| device.name().ok() == default_name)
            .map(|(id, _)| id))
    }

    fn open_output(
        &self,
        device_id: &DeviceId,
        config: AudioConfig,
        cb: Arc<dyn AudioRenderCallback>,
    ) -> Result<Box<dyn AudioStreamHandle>, AudioError> {
        let device_id = device_id.clone();
        let desired = config;
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let (control_tx, control_rx) = mpsc::channel::<Control>();
        let suspended = Arc::new(AtomicBool::new(true));
        let suspended_flag = suspended.clone();

        // cpal streams are not Send on every backend; the stream lives on its own thread.
        let join_handle = thread::spawn(move || {
            let host = cpal::default_host();
            let device = match Self::list_devices_from_host(&host)
                .and_then(|devices| {
                    devices
                        .into_iter()
                        .find(|(id, _)| id == &device_id)
                        .map(|(_, device)| device)
                        .ok_or_else(|| AudioError::DeviceNotFound(device_id.to_string()))
                }) {
                Ok(device) => device,
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                    return;
                }
            };

            let stream_config = match Self::select_stream_config(&device, desired) {
                Ok(config) => config,
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                    return;
                }
            };

            let stream = match stream_config.sample_format {
                SampleFormat::F32 => build_stream::<f32>(&device, &stream_config.config, cb),
                SampleFormat::I16 => build_stream::<i16>(&device, &stream_config.config, cb),
                SampleFormat::U16 => build_stream::<u16>(&device, &stream_config.config, cb),
                _ => Err(cpal::BuildStreamError::StreamConfigNotSupported),
            };

            let stream = match stream {
                Ok(stream) => stream,
                Err(err) => {
                    let _ = ready_tx.send(Err(AudioError::Backend(err.to_string())));
                    return;
                }
            };

            // some backends start streams immediately
            let _ = stream.pause();
            let _ = ready_tx.send(Ok(()));

            while let Ok(control) = control_rx.recv() {
                match control {
                    Control::Play(reply) => {
                        let result = stream.play().map_err(|e| AudioError::Backend(e.to_string()));
                        if result.is_ok() {
                            suspended_flag.store(false, Ordering::Relaxed);
                        }
                        let _ = reply.send(result);
                    }
                    Control::Pause(reply) => {
                        let result = stream.pause().map_err(|e| AudioError::Backend(e.to_string()));
                        if result.is_ok() {
                            suspended_flag.store(true, Ordering::Relaxed);
                        }
                        let _ = reply.send(result);
                    }
                    Control::Close => break,
                }
            }
            drop(stream);
        });

        match ready_rx
            .recv()
            .map_err(|e| AudioError::Backend(e.to_string()))?
        {
            Ok(()) => Ok(Box::new(CpalAudioStreamHandle {
                control_tx,
                suspended,
                join_handle: Some(join_handle),
            })),
            Err(err) => Err(err),
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    cb: Arc<dyn AudioRenderCallback>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let initial_frames = match config.buffer_size {
        BufferSize::Fixed(frames) => frames as usize,
        BufferSize::Default => 8192,
    };
    let mut left: Vec<f32> = vec![0.0; initial_frames];
    let mut right: Vec<f32> = vec![0.0; initial_frames];
    let mut sample_time: u64 = 0;

    device.build_output_stream(
        config,
        move |data: &mut [T], _info: &cpal::OutputCallbackInfo| {
            let frames = data.len() / channels.max(1);
            if frames > left.len() {
                left.resize(frames, 0.0);
                right.resize(frames, 0.0);
            }
            cb.render(sample_time, &mut left[..frames], &mut right[..frames]);
            write_interleaved(data, channels, &left[..frames], &right[..frames]);
            sample_time = sample_time.saturating_add(frames as u64);
        },
        |err| log::error!("cpal stream error: {}", err),
        None,
    )
}

fn select_supported_config(
    supported: &mut dyn Iterator<Item = SupportedStreamConfigRange>,
    desired: AudioConfig,
) -> Result<cpal::SupportedStreamConfig, AudioError> {
    let mut best: Option<cpal::SupportedStreamConfig> = None;
    let mut best_score: i32 = -1;

    for config_range in supported {
        if config_range.channels() != desired.channels {
            continue;
        }
        let min = config_range.min_sample_rate().0;
        let max = config_range.max_sample_rate().0;
        if desired.sample_rate_hz < min || desired.sample_rate_hz > max {
            continue;
        }

        let score = match config_range.sample_format() {
            SampleFormat::F32 => 3,
            SampleFormat::I16 => 2,
            SampleFormat::U16 => 1,
            _ => 0,
        };

        if score > best_score {
            best = Some(config_range.with_sample_rate(SampleRate(desired.sample_rate_hz)));
            best_score = score;
        }
    }

    best.ok_or_else(|| AudioError::UnsupportedConfig("no matching stream config".to_string()))
}

fn write_interleaved<T>(data: &mut [T], channels: usize, left: &[f32], right: &[f32])
where
    T: SizedSample + FromSample<f32>,
{
    if channels == 0 {
        return;
    }
    let silence = T::from_sample(0.0_f32);
    for (frame, chunk) in data.chunks_mut(channels).enumerate() {
        let l = left.get(frame).copied().unwrap_or(0.0).clamp(-1.0, 1.0);
        let r = right.get(frame).copied().unwrap_or(0.0).clamp(-1.0, 1.0);
        match chunk.len() {
            1 => chunk[0] = T::from_sample((l + r) * 0.5),
            _ => {
                chunk[0] = T::from_sample(l);
                chunk[1] = T::from_sample(r);
                for slot in chunk.iter_mut().skip(2) {
                    *slot = silence;
                }
            }
        }
    }
}
