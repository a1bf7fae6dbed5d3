use crate::api::{pay_period, payslip, salary};
use crate::config::Config;
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-scope limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let api_limiter = build_limiter(config.rate_api_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(api_limiter) // rate limiting
            .service(
                web::scope("/periods")
                    // /periods
                    .service(
                        web::resource("")
                            .route(web::post().to(pay_period::create_period))
                            .route(web::get().to(pay_period::list_periods)),
                    )
                    // /periods/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(pay_period::get_period))
                            .route(web::put().to(pay_period::update_period))
                            .route(web::delete().to(pay_period::delete_period)),
                    )
                    // /periods/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::post().to(pay_period::approve_period)),
                    )
                    // /periods/{id}/close
                    .service(
                        web::resource("/{id}/close")
                            .route(web::post().to(pay_period::close_period)),
                    )
                    // /periods/{id}/recalculate
                    .service(
                        web::resource("/{id}/recalculate")
                            .route(web::post().to(pay_period::recalculate_period)),
                    ),
            )
            .service(
                web::scope("/payslips")
                    // /payslips
                    .service(
                        web::resource("")
                            .route(web::post().to(payslip::create_payslip))
                            .route(web::get().to(payslip::list_payslips)),
                    )
                    // /payslips/bulk (must register before /{id})
                    .service(
                        web::resource("/bulk")
                            .route(web::post().to(payslip::bulk_create_payslips)),
                    )
                    // /payslips/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(payslip::get_payslip))
                            .route(web::put().to(payslip::update_payslip))
                            .route(web::delete().to(payslip::delete_payslip)),
                    ),
            )
            .service(
                web::scope("/salary")
                    // /salary
                    .service(web::resource("").route(web::post().to(salary::create_salary)))
                    .service(
                        web::resource("/history").route(web::get().to(salary::salary_history)),
                    )
                    .service(
                        web::resource("/statistics")
                            .route(web::get().to(salary::salary_statistics)),
                    )
                    .service(web::resource("/trends").route(web::get().to(salary::salary_trends)))
                    .service(
                        web::resource("/employees/{employee_id}/history")
                            .route(web::get().to(salary::employee_salary_history)),
                    )
                    .service(
                        web::resource("/employees/{employee_id}/current")
                            .route(web::get().to(salary::current_salary)),
                    )
                    // /salary/{id}
                    .service(web::resource("/{id}").route(web::put().to(salary::update_salary)))
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::post().to(salary::approve_salary)),
                    ),
            ),
    );
}
